//! @ai:module:intent Expand a parsed benchmark file into benchmark descriptors
//! @ai:module:layer domain
//! @ai:module:public_api BenchmarkDescriptor, DescriptorFactory, Variables, cartesian_product
//! @ai:module:stateless true

use crate::definition::template::ValueEvaluator;
use crate::error::{LoadError, Result};
use indexmap::IndexMap;
use itertools::Itertools;
use serde_yaml_ng::{Mapping, Value};

/// Ordered variable bindings; iteration order is the author's declaration order.
pub type Variables = IndexMap<String, String>;

pub const VARIABLES_KEY: &str = "variables";
pub const DATA_SOURCE_KEY: &str = "data-source";
pub const QUERY_NAMES_KEY: &str = "query-names";
pub const RUNS_KEY: &str = "runs";
pub const PREWARM_RUNS_KEY: &str = "prewarm-runs";
pub const PREWARM_REPEATS_KEY: &str = "prewarm-repeats";
pub const CONCURRENCY_KEY: &str = "concurrency";
pub const FREQUENCY_KEY: &str = "frequency";
pub const BEFORE_BENCHMARK_MACROS_KEY: &str = "before-benchmark";
pub const AFTER_BENCHMARK_MACROS_KEY: &str = "after-benchmark";
pub const BEFORE_EXECUTION_MACROS_KEY: &str = "before-execution";
pub const AFTER_EXECUTION_MACROS_KEY: &str = "after-execution";

/// Keys that configure the run itself rather than parameterize it.
pub const RESERVED_KEYS: &[&str] = &[
    DATA_SOURCE_KEY,
    QUERY_NAMES_KEY,
    RUNS_KEY,
    PREWARM_RUNS_KEY,
    PREWARM_REPEATS_KEY,
    CONCURRENCY_KEY,
    FREQUENCY_KEY,
    BEFORE_BENCHMARK_MACROS_KEY,
    AFTER_BENCHMARK_MACROS_KEY,
    BEFORE_EXECUTION_MACROS_KEY,
    AFTER_EXECUTION_MACROS_KEY,
    VARIABLES_KEY,
    "base",
    "environment",
];

/// @ai:intent Check whether a variable name is one of the reserved descriptor keys
/// @ai:effects pure
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// @ai:intent Fully evaluated variable map for one concrete benchmark
/// @ai:invariant data-source and query-names are present
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkDescriptor {
    variables: Variables,
}

impl BenchmarkDescriptor {
    /// @ai:intent Wrap an evaluated variable map, checking mandatory keys
    /// @ai:effects pure
    pub fn new(variables: Variables) -> Result<Self> {
        for key in [DATA_SOURCE_KEY, QUERY_NAMES_KEY] {
            if !variables.contains_key(key) {
                return Err(LoadError::MissingMandatoryKey { key });
            }
        }
        Ok(Self { variables })
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn into_variables(self) -> Variables {
        self.variables
    }

    pub fn data_source(&self) -> &str {
        self.variables
            .get(DATA_SOURCE_KEY)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn query_names(&self) -> Vec<String> {
        self.list(QUERY_NAMES_KEY)
    }

    pub fn runs(&self) -> Result<Option<u32>> {
        self.integer(RUNS_KEY)
    }

    /// `prewarm-runs`, falling back to the older `prewarm-repeats` spelling.
    pub fn prewarm_runs(&self) -> Result<Option<u32>> {
        match self.integer(PREWARM_RUNS_KEY)? {
            Some(runs) => Ok(Some(runs)),
            None => self.integer(PREWARM_REPEATS_KEY),
        }
    }

    pub fn concurrency(&self) -> Result<Option<u32>> {
        self.integer(CONCURRENCY_KEY)
    }

    /// Staleness threshold in days.
    pub fn frequency(&self) -> Result<Option<u32>> {
        self.integer(FREQUENCY_KEY)
    }

    pub fn before_benchmark_macros(&self) -> Vec<String> {
        self.list(BEFORE_BENCHMARK_MACROS_KEY)
    }

    pub fn after_benchmark_macros(&self) -> Vec<String> {
        self.list(AFTER_BENCHMARK_MACROS_KEY)
    }

    pub fn before_execution_macros(&self) -> Vec<String> {
        self.list(BEFORE_EXECUTION_MACROS_KEY)
    }

    pub fn after_execution_macros(&self) -> Vec<String> {
        self.list(AFTER_EXECUTION_MACROS_KEY)
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.variables
            .get(key)
            .map(|value| split_list(value))
            .unwrap_or_default()
    }

    fn integer(&self, key: &str) -> Result<Option<u32>> {
        self.variables
            .get(key)
            .map(|value| {
                value.trim().parse::<u32>().map_err(|e| LoadError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

/// @ai:intent Split a comma-separated value, trimming and dropping empty items
/// @ai:effects pure
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// @ai:intent Cartesian product of a variable -> values group, in declaration order
/// @ai:post an empty group yields a single empty binding
/// @ai:effects pure
pub fn cartesian_product(group: &IndexMap<String, Vec<String>>) -> Vec<Variables> {
    if group.is_empty() {
        return vec![Variables::new()];
    }

    group
        .values()
        .map(|values| values.iter())
        .multi_cartesian_product()
        .map(|combination| {
            group
                .keys()
                .zip(combination)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .collect()
}

/// @ai:intent Turns benchmark YAML mappings into evaluated descriptors
pub struct DescriptorFactory {
    evaluator: ValueEvaluator,
}

impl DescriptorFactory {
    /// @ai:intent Create a new descriptor factory
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            evaluator: ValueEvaluator::new(),
        }
    }

    /// @ai:intent Expand variable groups, merge globals and evaluate templates
    /// @ai:post one descriptor per Cartesian combination, groups in declaration order
    /// @ai:effects pure
    pub fn create_descriptors(&self, yaml: &Mapping) -> Result<Vec<BenchmarkDescriptor>> {
        let combinations = extract_variable_combinations(yaml)?;
        let globals = extract_global_variables(yaml);

        combinations
            .into_iter()
            .map(|mut variables| {
                for (key, value) in &globals {
                    if !variables.contains_key(key) {
                        variables.insert(key.clone(), value.clone());
                    }
                }

                self.evaluator.evaluate_variables(&mut variables)?;
                BenchmarkDescriptor::new(variables)
            })
            .collect()
    }
}

impl Default for DescriptorFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_variable_combinations(yaml: &Mapping) -> Result<Vec<Variables>> {
    let groups = match yaml.get(VARIABLES_KEY) {
        None | Some(Value::Null) => return Ok(vec![Variables::new()]),
        Some(Value::Mapping(groups)) => groups,
        Some(other) => {
            return Err(LoadError::InvalidValue {
                key: VARIABLES_KEY.to_string(),
                value: stringify(other).unwrap_or_default(),
                reason: "expected a mapping of variable groups".to_string(),
            })
        }
    };

    let mut combinations = Vec::new();
    for (group_name, group) in groups {
        let group = stringify_multimap(group_name, group)?;
        combinations.extend(cartesian_product(&group));
    }

    if combinations.is_empty() {
        combinations.push(Variables::new());
    }

    Ok(combinations)
}

fn stringify_multimap(group_name: &Value, group: &Value) -> Result<IndexMap<String, Vec<String>>> {
    let group_name = stringify(group_name).unwrap_or_default();
    let group = match group {
        Value::Mapping(group) => group,
        other => {
            return Err(LoadError::InvalidValue {
                key: format!("{}.{}", VARIABLES_KEY, group_name),
                value: stringify(other).unwrap_or_default(),
                reason: "expected a mapping of variable values".to_string(),
            })
        }
    };

    group
        .iter()
        .map(|(key, value)| {
            let key = stringify(key).unwrap_or_default();
            let values = as_string_list(value).ok_or_else(|| LoadError::InvalidValue {
                key: format!("{}.{}.{}", VARIABLES_KEY, group_name, key),
                value: String::new(),
                reason: "null value".to_string(),
            })?;
            Ok::<_, LoadError>((key, values))
        })
        .collect()
}

/// @ai:intent Coerce a YAML value into a list of strings; `None` for null
/// @ai:effects pure
pub fn as_string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => None,
        Value::Sequence(items) => Some(items.iter().filter_map(stringify).collect()),
        other => stringify(other).map(|text| split_list(&text)),
    }
}

fn extract_global_variables(yaml: &Mapping) -> Variables {
    yaml.iter()
        .filter_map(|(key, value)| {
            let key = stringify(key)?;
            if key == VARIABLES_KEY {
                return None;
            }
            stringify(value).map(|value| (key, value))
        })
        .collect()
}

/// @ai:intent Render a YAML value as the string stored in a variable map
/// @ai:post sequences are joined with ", " so they split back into the same items
/// @ai:effects pure
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(items) => Some(items.iter().filter_map(stringify).join(", ")),
        Value::Mapping(mapping) => Some(format!(
            "{{{}}}",
            mapping
                .iter()
                .map(|(k, v)| format!(
                    "{}={}",
                    stringify(k).unwrap_or_default(),
                    stringify(v).unwrap_or_default()
                ))
                .join(", ")
        )),
        Value::Tagged(tagged) => stringify(&tagged.value),
    }
}
