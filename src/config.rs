//! @ai:module:intent Configuration structs for the benchmark resolver
//! @ai:module:layer infrastructure
//! @ai:module:public_api LoaderConfig, ServiceConfig
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// @ai:intent Immutable configuration handed to the benchmark loader
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoaderConfig {
    /// Location of the benchmark YAML tree (`classpath:`, `file:`, absolute or relative)
    #[serde(default = "default_benchmarks_dir")]
    pub benchmarks_dir: String,
    #[serde(default = "default_sql_dir")]
    pub sql_dir: String,
    #[serde(default = "default_environment_name")]
    pub environment_name: String,
    /// Benchmark names (relative path without extension) to keep; all when unset
    #[serde(default)]
    pub active_benchmarks: Option<Vec<String>>,
    /// `key=regex,key2=regex2` predicate on benchmark variables
    #[serde(default)]
    pub active_variables: Option<String>,
    #[serde(default = "default_frequency_check_enabled")]
    pub frequency_check_enabled: bool,
    /// Roots searched, in order, for `classpath:` locations
    #[serde(default = "default_classpath_roots")]
    pub classpath_roots: Vec<PathBuf>,
    #[serde(default)]
    pub service: ServiceConfig,
}

/// @ai:intent Connection settings for the results service
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceConfig {
    #[serde(default = "default_service_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            benchmarks_dir: default_benchmarks_dir(),
            sql_dir: default_sql_dir(),
            environment_name: default_environment_name(),
            active_benchmarks: None,
            active_variables: None,
            frequency_check_enabled: default_frequency_check_enabled(),
            classpath_roots: default_classpath_roots(),
            service: ServiceConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            url: default_service_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_benchmarks_dir() -> String {
    "benchmarks".to_string()
}

fn default_sql_dir() -> String {
    "sql".to_string()
}

fn default_environment_name() -> String {
    "default".to_string()
}

fn default_frequency_check_enabled() -> bool {
    true
}

fn default_classpath_roots() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_service_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl LoaderConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Check whether a benchmark name passes the active-benchmarks list
    /// @ai:effects pure
    pub fn is_active_benchmark(&self, name: &str) -> bool {
        self.active_benchmarks
            .as_ref()
            .map(|names| names.iter().any(|active| active == name))
            .unwrap_or(true)
    }
}
