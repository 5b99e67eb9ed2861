//! @ai:module:intent Load SQL query files referenced by benchmarks
//! @ai:module:layer infrastructure
//! @ai:module:public_api QueryLoaderTrait, SqlQueryLoader
//! @ai:module:stateless true

use crate::benchmark::types::Query;
use crate::error::Result;
use crate::resource::FileReader;
use indexmap::IndexMap;
use std::path::Path;

const ATTRIBUTE_PREFIX: &str = "--!";

/// @ai:intent Trait for resolving query names to SQL
pub trait QueryLoaderTrait: Send + Sync {
    /// @ai:intent Load queries in the given order
    fn load_from_files(&self, names: &[String]) -> Result<Vec<Query>>;
}

/// @ai:intent Reads queries from `<sql-dir>/<name>` through the file reader
pub struct SqlQueryLoader {
    reader: FileReader,
    sql_dir: String,
}

impl SqlQueryLoader {
    /// @ai:intent Create a loader rooted at a SQL directory location
    /// @ai:effects pure
    pub fn new(reader: FileReader, sql_dir: impl Into<String>) -> Self {
        Self {
            reader,
            sql_dir: sql_dir.into(),
        }
    }

    /// @ai:intent Load a single query file
    /// @ai:effects fs:read
    fn load_from_file(&self, name: &str) -> Result<Query> {
        let location = format!("{}/{}", self.sql_dir.trim_end_matches('/'), name);
        let content = self.reader.resolve(&location)?.read_to_string()?;
        let query_name = Path::new(name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());

        tracing::debug!("Loaded query {} from {}", query_name, location);
        Ok(parse_query(query_name, &content))
    }
}

impl QueryLoaderTrait for SqlQueryLoader {
    /// @ai:effects fs:read
    fn load_from_files(&self, names: &[String]) -> Result<Vec<Query>> {
        names.iter().map(|name| self.load_from_file(name)).collect()
    }
}

/// @ai:intent Split leading `--! key: value` lines from the SQL body
/// @ai:effects pure
fn parse_query(name: String, content: &str) -> Query {
    let mut attributes = IndexMap::new();
    let mut body = Vec::new();
    let mut in_header = true;

    for line in content.lines() {
        if in_header {
            if let Some(attribute) = line.trim_start().strip_prefix(ATTRIBUTE_PREFIX) {
                if let Some((key, value)) = attribute.split_once(':') {
                    attributes.insert(key.trim().to_string(), value.trim().to_string());
                }
                continue;
            }
            in_header = false;
        }
        body.push(line);
    }

    Query {
        name,
        sql: body.join("\n").trim().to_string(),
        attributes,
    }
}

/// @ai:intent Query loader returning a fixed body for every name
#[cfg(test)]
pub struct MockQueryLoader;

#[cfg(test)]
impl QueryLoaderTrait for MockQueryLoader {
    fn load_from_files(&self, names: &[String]) -> Result<Vec<Query>> {
        Ok(names
            .iter()
            .map(|name| Query::new(name.clone(), "test query"))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_attributes_and_body() {
        let query = parse_query(
            "q1".to_string(),
            "--! timeout: 30s\n--! label: first\nSELECT *\nFROM t\n--! not-an-attribute: x\n",
        );

        assert_eq!(query.attributes.get("timeout").map(String::as_str), Some("30s"));
        assert_eq!(query.attributes.get("label").map(String::as_str), Some("first"));
        assert_eq!(query.sql, "SELECT *\nFROM t\n--! not-an-attribute: x");
    }

    #[test]
    fn test_load_from_files_in_order() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("q1.sql"), "SELECT 1\n").unwrap();
        std::fs::write(temp.path().join("q2.sql"), "SELECT 2\n").unwrap();

        let loader = SqlQueryLoader::new(
            FileReader::default(),
            temp.path().to_string_lossy().into_owned(),
        );
        let queries = loader
            .load_from_files(&["q2.sql".to_string(), "q1.sql".to_string()])
            .unwrap();

        let names: Vec<&str> = queries.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["q2", "q1"]);
        assert_eq!(queries[0].sql, "SELECT 2");
    }

    #[test]
    fn test_load_from_classpath_sql_dir() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/resources");
        let loader = SqlQueryLoader::new(FileReader::new(vec![root]), "classpath:sql/");
        let queries = loader.load_from_files(&["q1.sql".to_string()]).unwrap();

        assert_eq!(queries[0].name, "q1");
        assert_eq!(queries[0].sql, "SELECT 1");
        assert_eq!(
            queries[0].attributes.get("description").map(String::as_str),
            Some("smoke query")
        );
    }

    #[test]
    fn test_missing_query_file() {
        let temp = TempDir::new().unwrap();
        let loader = SqlQueryLoader::new(
            FileReader::default(),
            temp.path().to_string_lossy().into_owned(),
        );

        assert!(matches!(
            loader.load_from_files(&["missing.sql".to_string()]),
            Err(LoadError::LocationNotFound(_))
        ));
    }
}
