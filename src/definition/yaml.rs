//! @ai:module:intent YAML benchmark file parsing with `base:` inheritance
//! @ai:module:layer infrastructure
//! @ai:module:public_api parse, load_benchmark, merge
//! @ai:module:stateless true

use crate::error::{LoadError, Result};
use crate::resource::Resource;
use serde_yaml_ng::{Mapping, Value};
use std::collections::HashSet;
use std::path::PathBuf;

pub const BASE_KEY: &str = "base";

/// @ai:intent Parse YAML text into an ordered top-level mapping
/// @ai:post an empty document yields an empty mapping
/// @ai:effects pure
pub fn parse(text: &str) -> Result<Mapping> {
    if text.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let value: Value = serde_yaml_ng::from_str(text).map_err(|e| LoadError::ParseFailure {
        message: e.to_string(),
    })?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(LoadError::ParseFailure {
            message: format!("top-level element must be a mapping, found {:?}", other),
        }),
    }
}

/// @ai:intent Load a benchmark file, resolving `base:` parents relative to its directory
/// @ai:effects fs:read
pub fn load_benchmark(file: &Resource) -> Result<Mapping> {
    let mut visited = HashSet::new();
    load_with_base(file, &mut visited)
}

fn load_with_base(file: &Resource, visited: &mut HashSet<PathBuf>) -> Result<Mapping> {
    let path = file.path();
    let canonical = path.canonicalize().map_err(|source| LoadError::ReadFailure {
        path: path.to_path_buf(),
        source,
    })?;

    if !visited.insert(canonical) {
        return Err(LoadError::ParseFailure {
            message: format!("cyclic base reference through {}", path.display()),
        });
    }

    let mut yaml = parse(&file.read_to_string()?)?;

    if let Some(base) = yaml.shift_remove(BASE_KEY) {
        let base = match base {
            Value::String(base) => base,
            _ => {
                return Err(LoadError::BaseNotAString {
                    path: path.to_path_buf(),
                })
            }
        };

        let base_yaml = load_with_base(&file.sibling(&base), visited)?;
        merge(&mut yaml, base_yaml);
    }

    Ok(yaml)
}

/// @ai:intent Merge a parent mapping into a child; the child wins except where both are mappings
/// @ai:post sequences are replaced, never element-merged
/// @ai:effects pure
pub fn merge(child: &mut Mapping, parent: Mapping) {
    for (key, parent_value) in parent {
        match child.get_mut(&key) {
            Some(Value::Mapping(child_mapping)) => {
                if let Value::Mapping(parent_mapping) = parent_value {
                    merge(child_mapping, parent_mapping);
                }
            }
            Some(_) => {}
            None => {
                child.insert(key, parent_value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::resource::FileReader;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &[u8]) -> Resource {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        FileReader::default().resolve(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_parse_keeps_author_order() {
        let yaml = parse("b: 1\na: 2\nc: 3\n").unwrap();
        let keys: Vec<&str> = yaml.keys().filter_map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_parse_empty_and_invalid() {
        assert!(parse("").unwrap().is_empty());
        assert!(matches!(
            parse("- a\n- b\n"),
            Err(LoadError::ParseFailure { .. })
        ));
        assert!(matches!(
            parse("a: [unclosed"),
            Err(LoadError::ParseFailure { .. })
        ));
    }

    #[test]
    fn test_base_is_merged_into_child() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "common/base.yaml",
            b"data-source: foo\nruns: 5\nquery-names: [q1, q2]\nvariables:\n  g1:\n    size: 1GB\n    format: orc\n",
        );
        let child = write(
            temp.path(),
            "suite/child.yaml",
            b"base: ../common/base.yaml\nruns: 10\nquery-names: [q3]\nvariables:\n  g1:\n    size: 2GB\n",
        );

        let yaml = load_benchmark(&child).unwrap();
        let expected = parse(
            "runs: 10\nquery-names: [q3]\nvariables:\n  g1:\n    size: 2GB\n    format: orc\ndata-source: foo\n",
        )
        .unwrap();

        assert_eq!(yaml, expected);
        assert!(!yaml.contains_key(BASE_KEY));
    }

    #[test]
    fn test_base_chain() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "root.yaml", b"data-source: root\nconcurrency: 4\n");
        write(temp.path(), "middle.yaml", b"base: root.yaml\ndata-source: middle\n");
        let leaf = write(temp.path(), "leaf.yaml", b"base: middle.yaml\nruns: 1\n");

        let yaml = load_benchmark(&leaf).unwrap();
        assert_eq!(yaml.get("data-source").and_then(Value::as_str), Some("middle"));
        assert_eq!(yaml.get("concurrency").and_then(Value::as_u64), Some(4));
    }

    #[test]
    fn test_base_not_a_string() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "bad.yaml", b"base: [a, b]\ndata-source: foo\n");

        assert!(matches!(
            load_benchmark(&path),
            Err(LoadError::BaseNotAString { .. })
        ));
    }

    #[test]
    fn test_base_cycle_is_rejected() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.yaml", b"base: b.yaml\n");
        let b = write(temp.path(), "b.yaml", b"base: a.yaml\n");

        assert!(matches!(
            load_benchmark(&b),
            Err(LoadError::ParseFailure { .. })
        ));
    }

    #[test]
    fn test_unreadable_file_is_read_failure() {
        let temp = TempDir::new().unwrap();
        let file = write(temp.path(), "binary.yaml", &[0xff, 0xfe, 0x00]);

        match load_benchmark(&file) {
            Err(LoadError::ReadFailure { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected read failure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_base_is_read_failure() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "child.yaml", b"base: missing.yaml\n");

        assert!(matches!(
            load_benchmark(&path),
            Err(LoadError::ReadFailure { .. })
        ));
    }
}
