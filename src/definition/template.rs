//! @ai:module:intent Embedded template engine for `${...}` variable values
//! @ai:module:layer domain
//! @ai:module:public_api ValueEvaluator
//! @ai:module:stateless true
//!
//! Supported syntax:
//!
//! * `${name}` interpolation, `${name!"fallback"}` / `${name!}` when `name` may be undefined
//! * `<#if cond>...<#elseif cond>...<#else>...</#if>` where `cond` is `name`, `!name`,
//!   `name == "literal"` or `name != "literal"`
//! * `<#list name as item>...</#list>` over the comma-separated value of `name`

use crate::definition::descriptor::Variables;
use crate::error::{LoadError, Result};
use regex::Regex;

/// @ai:intent Expands templated variables using the variable map as binding environment
pub struct ValueEvaluator {
    templated_regex: Regex,
}

impl ValueEvaluator {
    /// @ai:intent Create a new evaluator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            templated_regex: Regex::new(r"(?s)^.*\$\{.+\}.*$").unwrap(),
        }
    }

    /// @ai:intent Check whether a value still needs evaluation
    /// @ai:effects pure
    pub fn is_templated(&self, value: &str) -> bool {
        self.templated_regex.is_match(value)
    }

    /// @ai:intent Render every templated variable once, in iteration order
    /// @ai:post no value matches the templated pattern
    /// @ai:effects pure
    pub fn evaluate_variables(&self, variables: &mut Variables) -> Result<()> {
        let keys: Vec<String> = variables.keys().cloned().collect();

        for key in keys {
            let expression = match variables.get(&key) {
                Some(value) if self.is_templated(value) => value.clone(),
                _ => continue,
            };

            let template_failure = |reason: String| LoadError::TemplateFailure {
                expression: expression.clone(),
                reason,
            };
            let template = Template::compile(&expression).map_err(template_failure)?;
            let rendered = template.render(variables).map_err(template_failure)?;

            if self.is_templated(&rendered) {
                return Err(LoadError::RecursiveSubstitution {
                    variable: key,
                    expression,
                });
            }

            variables.insert(key, rendered);
        }

        Ok(())
    }
}

impl Default for ValueEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Text(String),
    Interpolation(String),
    If(String),
    ElseIf(String),
    Else,
    EndIf,
    List(String),
    EndList,
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Truthy(String),
    Not(String),
    Equals(String, String),
    NotEquals(String, String),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Interpolation {
        name: String,
        default: Option<String>,
    },
    If {
        branches: Vec<(Condition, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
    List {
        source: String,
        item: String,
        body: Vec<Node>,
    },
}

/// Parsed template, rendered against a variable map.
struct Template {
    nodes: Vec<Node>,
}

impl Template {
    fn compile(source: &str) -> std::result::Result<Self, String> {
        let tokens = tokenize(source)?;
        let mut iter = tokens.into_iter();
        let (nodes, terminator) = parse_block(&mut iter)?;

        match terminator {
            None => Ok(Self { nodes }),
            Some(token) => Err(format!("unexpected {:?}", token)),
        }
    }

    fn render(&self, variables: &Variables) -> std::result::Result<String, String> {
        let mut output = String::new();
        let mut scope = Scope {
            variables,
            locals: Vec::new(),
        };
        render_nodes(&self.nodes, &mut scope, &mut output)?;
        Ok(output)
    }
}

fn tokenize(source: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = source;

    while let Some(c) = rest.chars().next() {
        let (token, remaining) = if let Some(after) = rest.strip_prefix("${") {
            let end = after
                .find('}')
                .ok_or_else(|| "unterminated ${ expression".to_string())?;
            let expression = after[..end].trim();
            if expression.is_empty() {
                return Err("empty ${} expression".to_string());
            }
            (
                Token::Interpolation(expression.to_string()),
                &after[end + 1..],
            )
        } else if let Some(after) = rest.strip_prefix("</#") {
            let end = after
                .find('>')
                .ok_or_else(|| "unterminated closing directive".to_string())?;
            let token = match after[..end].trim() {
                "if" => Token::EndIf,
                "list" => Token::EndList,
                other => return Err(format!("unknown closing directive </#{}>", other)),
            };
            (token, &after[end + 1..])
        } else if let Some(after) = rest.strip_prefix("<#") {
            let end = after
                .find('>')
                .ok_or_else(|| "unterminated directive".to_string())?;
            (parse_directive(after[..end].trim())?, &after[end + 1..])
        } else {
            text.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        };

        if !text.is_empty() {
            tokens.push(Token::Text(std::mem::take(&mut text)));
        }
        tokens.push(token);
        rest = remaining;
    }

    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }

    Ok(tokens)
}

fn parse_directive(directive: &str) -> std::result::Result<Token, String> {
    let (keyword, argument) = directive
        .split_once(char::is_whitespace)
        .map(|(k, a)| (k, a.trim()))
        .unwrap_or((directive, ""));

    match (keyword, argument.is_empty()) {
        ("if", false) => Ok(Token::If(argument.to_string())),
        ("elseif", false) => Ok(Token::ElseIf(argument.to_string())),
        ("else", true) => Ok(Token::Else),
        ("list", false) => Ok(Token::List(argument.to_string())),
        _ => Err(format!("unsupported directive <#{}>", directive)),
    }
}

/// Parses nodes up to the next block-structural token, which is returned to the caller.
fn parse_block(
    tokens: &mut std::vec::IntoIter<Token>,
) -> std::result::Result<(Vec<Node>, Option<Token>), String> {
    let mut nodes = Vec::new();

    while let Some(token) = tokens.next() {
        match token {
            Token::Text(text) => nodes.push(Node::Text(text)),
            Token::Interpolation(expression) => nodes.push(parse_interpolation(&expression)?),
            Token::If(condition) => nodes.push(parse_if(condition, tokens)?),
            Token::List(header) => {
                let (source, item) = parse_list_header(&header)?;
                let (body, terminator) = parse_block(tokens)?;
                if terminator != Some(Token::EndList) {
                    return Err(format!("<#list {}> is not closed by </#list>", header));
                }
                nodes.push(Node::List { source, item, body });
            }
            structural => return Ok((nodes, Some(structural))),
        }
    }

    Ok((nodes, None))
}

fn parse_if(
    first_condition: String,
    tokens: &mut std::vec::IntoIter<Token>,
) -> std::result::Result<Node, String> {
    let mut branches = Vec::new();
    let mut condition = parse_condition(&first_condition)?;

    loop {
        let (body, terminator) = parse_block(tokens)?;
        branches.push((condition, body));

        match terminator {
            Some(Token::ElseIf(next)) => condition = parse_condition(&next)?,
            Some(Token::Else) => {
                let (otherwise, terminator) = parse_block(tokens)?;
                if terminator != Some(Token::EndIf) {
                    return Err("<#else> is not closed by </#if>".to_string());
                }
                return Ok(Node::If {
                    branches,
                    otherwise,
                });
            }
            Some(Token::EndIf) => {
                return Ok(Node::If {
                    branches,
                    otherwise: Vec::new(),
                })
            }
            other => return Err(format!("<#if> is not closed by </#if>, found {:?}", other)),
        }
    }
}

fn parse_interpolation(expression: &str) -> std::result::Result<Node, String> {
    match expression.split_once('!') {
        Some((name, default)) => Ok(Node::Interpolation {
            name: parse_name(name)?,
            default: Some(parse_literal(default).unwrap_or_else(|| default.trim().to_string())),
        }),
        None => Ok(Node::Interpolation {
            name: parse_name(expression)?,
            default: None,
        }),
    }
}

fn parse_condition(condition: &str) -> std::result::Result<Condition, String> {
    if let Some((name, literal)) = condition.split_once("!=") {
        return Ok(Condition::NotEquals(
            parse_name(name)?,
            parse_required_literal(literal)?,
        ));
    }
    if let Some((name, literal)) = condition.split_once("==") {
        return Ok(Condition::Equals(
            parse_name(name)?,
            parse_required_literal(literal)?,
        ));
    }
    if let Some(name) = condition.trim().strip_prefix('!') {
        return Ok(Condition::Not(parse_name(name)?));
    }
    let name = condition.trim().trim_end_matches("??");
    Ok(Condition::Truthy(parse_name(name)?))
}

fn parse_list_header(header: &str) -> std::result::Result<(String, String), String> {
    let parts: Vec<&str> = header.split_whitespace().collect();
    match parts.as_slice() {
        [source, "as", item] => Ok((parse_name(source)?, parse_name(item)?)),
        _ => Err(format!("expected <#list name as item>, found <#list {}>", header)),
    }
}

fn parse_name(name: &str) -> std::result::Result<String, String> {
    let name = name.trim();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if valid {
        Ok(name.to_string())
    } else {
        Err(format!("invalid variable name '{}'", name))
    }
}

fn parse_literal(literal: &str) -> Option<String> {
    let literal = literal.trim();
    ['"', '\'']
        .iter()
        .find_map(|quote| {
            literal
                .strip_prefix(*quote)
                .and_then(|rest| rest.strip_suffix(*quote))
        })
        .map(str::to_string)
}

fn parse_required_literal(literal: &str) -> std::result::Result<String, String> {
    parse_literal(literal).ok_or_else(|| format!("expected quoted literal, found {}", literal.trim()))
}

struct Scope<'a> {
    variables: &'a Variables,
    locals: Vec<(String, String)>,
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.locals
            .iter()
            .rev()
            .find(|(local, _)| local == name)
            .map(|(_, value)| value.as_str())
            .or_else(|| self.variables.get(name).map(String::as_str))
    }

    fn require(&self, name: &str) -> std::result::Result<&str, String> {
        self.lookup(name)
            .ok_or_else(|| format!("variable '{}' is not defined", name))
    }

    fn test(&self, condition: &Condition) -> std::result::Result<bool, String> {
        Ok(match condition {
            Condition::Truthy(name) => is_truthy(self.lookup(name)),
            Condition::Not(name) => !is_truthy(self.lookup(name)),
            Condition::Equals(name, literal) => self.require(name)? == literal.as_str(),
            Condition::NotEquals(name, literal) => self.require(name)? != literal.as_str(),
        })
    }
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "false")
}

fn render_nodes(
    nodes: &[Node],
    scope: &mut Scope<'_>,
    output: &mut String,
) -> std::result::Result<(), String> {
    for node in nodes {
        match node {
            Node::Text(text) => output.push_str(text),
            Node::Interpolation { name, default } => match (scope.lookup(name), default) {
                (Some(value), _) => output.push_str(value),
                (None, Some(default)) => output.push_str(default),
                (None, None) => return Err(format!("variable '{}' is not defined", name)),
            },
            Node::If {
                branches,
                otherwise,
            } => {
                let mut selected = otherwise;
                for (condition, body) in branches {
                    if scope.test(condition)? {
                        selected = body;
                        break;
                    }
                }
                render_nodes(selected, scope, output)?;
            }
            Node::List { source, item, body } => {
                let values: Vec<String> = scope
                    .require(source)?
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect();

                for value in values {
                    scope.locals.push((item.clone(), value));
                    let rendered = render_nodes(body, scope, output);
                    scope.locals.pop();
                    rendered?;
                }
            }
        }
    }

    Ok(())
}
