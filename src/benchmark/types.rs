//! @ai:module:intent Immutable benchmark and query values
//! @ai:module:layer domain
//! @ai:module:public_api Benchmark, BenchmarkBuilder, Query, build_benchmark

use crate::definition::descriptor::{is_reserved_key, BenchmarkDescriptor, Variables};
use crate::error::{LoadError, Result};
use chrono::Duration;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

pub const DEFAULT_RUNS: u32 = 3;
pub const DEFAULT_CONCURRENCY: u32 = 1;
pub const DEFAULT_PREWARM_RUNS: u32 = 0;

/// @ai:intent One SQL statement a benchmark executes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    /// File name without its extension
    pub name: String,
    pub sql: String,
    /// `--! key: value` header lines
    pub attributes: IndexMap<String, String>,
}

impl Query {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            attributes: IndexMap::new(),
        }
    }
}

/// @ai:intent Fully resolved description of one concrete benchmark run
/// @ai:invariant runs >= 1, concurrency >= 1
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Benchmark {
    name: String,
    sequence_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    unique_name: Option<String>,
    data_source: String,
    environment: String,
    runs: u32,
    prewarm_runs: u32,
    concurrency: u32,
    #[serde(serialize_with = "serialize_days")]
    frequency: Option<Duration>,
    before_benchmark_macros: Vec<String>,
    after_benchmark_macros: Vec<String>,
    before_execution_macros: Vec<String>,
    after_execution_macros: Vec<String>,
    queries: Vec<Query>,
    variables: Variables,
}

fn serialize_days<S: Serializer>(
    frequency: &Option<Duration>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match frequency {
        Some(duration) => serializer.serialize_some(&duration.num_days()),
        None => serializer.serialize_none(),
    }
}

impl Benchmark {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence_id(&self) -> &str {
        &self.sequence_id
    }

    /// Set once the results service has named the benchmark.
    pub fn unique_name(&self) -> Option<&str> {
        self.unique_name.as_deref()
    }

    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn prewarm_runs(&self) -> u32 {
        self.prewarm_runs
    }

    pub fn concurrency(&self) -> u32 {
        self.concurrency
    }

    pub fn frequency(&self) -> Option<Duration> {
        self.frequency
    }

    pub fn before_benchmark_macros(&self) -> &[String] {
        &self.before_benchmark_macros
    }

    pub fn after_benchmark_macros(&self) -> &[String] {
        &self.after_benchmark_macros
    }

    pub fn before_execution_macros(&self) -> &[String] {
        &self.before_execution_macros
    }

    pub fn after_execution_macros(&self) -> &[String] {
        &self.after_execution_macros
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// @ai:intent Variables that parameterize the benchmark, without run settings
    /// @ai:effects pure
    pub fn non_reserved_variables(&self) -> Variables {
        self.variables
            .iter()
            .filter(|(key, _)| !is_reserved_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// @ai:intent Attach the service-assigned unique name
    /// @ai:effects pure
    pub fn with_unique_name(self, unique_name: String) -> Self {
        Self {
            unique_name: Some(unique_name),
            ..self
        }
    }
}

/// @ai:intent Step-by-step construction of a validated benchmark
#[derive(Debug, Clone)]
pub struct BenchmarkBuilder {
    name: String,
    sequence_id: String,
    queries: Vec<Query>,
    data_source: String,
    environment: String,
    runs: u32,
    prewarm_runs: u32,
    concurrency: u32,
    frequency: Option<Duration>,
    before_benchmark_macros: Vec<String>,
    after_benchmark_macros: Vec<String>,
    before_execution_macros: Vec<String>,
    after_execution_macros: Vec<String>,
    variables: Variables,
}

impl BenchmarkBuilder {
    pub fn new(name: impl Into<String>, sequence_id: impl Into<String>, queries: Vec<Query>) -> Self {
        Self {
            name: name.into(),
            sequence_id: sequence_id.into(),
            queries,
            data_source: String::new(),
            environment: String::new(),
            runs: DEFAULT_RUNS,
            prewarm_runs: DEFAULT_PREWARM_RUNS,
            concurrency: DEFAULT_CONCURRENCY,
            frequency: None,
            before_benchmark_macros: Vec::new(),
            after_benchmark_macros: Vec::new(),
            before_execution_macros: Vec::new(),
            after_execution_macros: Vec::new(),
            variables: Variables::new(),
        }
    }

    pub fn with_data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = data_source.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_prewarm_runs(mut self, prewarm_runs: u32) -> Self {
        self.prewarm_runs = prewarm_runs;
        self
    }

    pub fn with_concurrency(mut self, concurrency: u32) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_frequency(mut self, frequency: Option<Duration>) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_before_benchmark_macros(mut self, macros: Vec<String>) -> Self {
        self.before_benchmark_macros = macros;
        self
    }

    pub fn with_after_benchmark_macros(mut self, macros: Vec<String>) -> Self {
        self.after_benchmark_macros = macros;
        self
    }

    pub fn with_before_execution_macros(mut self, macros: Vec<String>) -> Self {
        self.before_execution_macros = macros;
        self
    }

    pub fn with_after_execution_macros(mut self, macros: Vec<String>) -> Self {
        self.after_execution_macros = macros;
        self
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// @ai:intent Validate run settings and freeze the benchmark
    /// @ai:effects pure
    pub fn build(self) -> Result<Benchmark> {
        if self.runs < 1 {
            return Err(invalid("runs", self.runs, "must be at least 1"));
        }
        if self.concurrency < 1 {
            return Err(invalid("concurrency", self.concurrency, "must be at least 1"));
        }

        Ok(Benchmark {
            name: self.name,
            sequence_id: self.sequence_id,
            unique_name: None,
            data_source: self.data_source,
            environment: self.environment,
            runs: self.runs,
            prewarm_runs: self.prewarm_runs,
            concurrency: self.concurrency,
            frequency: self.frequency,
            before_benchmark_macros: self.before_benchmark_macros,
            after_benchmark_macros: self.after_benchmark_macros,
            before_execution_macros: self.before_execution_macros,
            after_execution_macros: self.after_execution_macros,
            queries: self.queries,
            variables: self.variables,
        })
    }
}

fn invalid(key: &str, value: u32, reason: &str) -> LoadError {
    LoadError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// @ai:intent Build a benchmark from an evaluated descriptor and its loaded queries
/// @ai:post unset runs/concurrency/prewarm-runs take their defaults; frequency is in days
/// @ai:effects pure
pub fn build_benchmark(
    name: &str,
    sequence_id: &str,
    environment: &str,
    descriptor: &BenchmarkDescriptor,
    queries: Vec<Query>,
) -> Result<Benchmark> {
    BenchmarkBuilder::new(name, sequence_id, queries)
        .with_data_source(descriptor.data_source())
        .with_environment(environment)
        .with_runs(descriptor.runs()?.unwrap_or(DEFAULT_RUNS))
        .with_prewarm_runs(descriptor.prewarm_runs()?.unwrap_or(DEFAULT_PREWARM_RUNS))
        .with_concurrency(descriptor.concurrency()?.unwrap_or(DEFAULT_CONCURRENCY))
        .with_frequency(descriptor.frequency()?.map(|days| Duration::days(i64::from(days))))
        .with_before_benchmark_macros(descriptor.before_benchmark_macros())
        .with_after_benchmark_macros(descriptor.after_benchmark_macros())
        .with_before_execution_macros(descriptor.before_execution_macros())
        .with_after_execution_macros(descriptor.after_execution_macros())
        .with_variables(descriptor.variables().clone())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn descriptor(pairs: &[(&str, &str)]) -> BenchmarkDescriptor {
        BenchmarkDescriptor::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let d = descriptor(&[("data-source", "foo"), ("query-names", "q1")]);
        let benchmark = build_benchmark("simple", "seq", "env", &d, vec![Query::new("q1", "select 1")]).unwrap();

        assert_eq!(benchmark.runs(), 3);
        assert_eq!(benchmark.concurrency(), 1);
        assert_eq!(benchmark.prewarm_runs(), 0);
        assert_eq!(benchmark.frequency(), None);
        assert_eq!(benchmark.environment(), "env");
        assert_eq!(benchmark.unique_name(), None);
    }

    #[test]
    fn test_descriptor_values_used() {
        let d = descriptor(&[
            ("data-source", "foo"),
            ("query-names", "q1"),
            ("runs", "10"),
            ("concurrency", "20"),
            ("prewarm-runs", "2"),
            ("frequency", "7"),
            ("after-benchmark", "no-op2"),
        ]);
        let benchmark = build_benchmark("c", "seq", "env", &d, Vec::new()).unwrap();

        assert_eq!(benchmark.runs(), 10);
        assert_eq!(benchmark.concurrency(), 20);
        assert_eq!(benchmark.prewarm_runs(), 2);
        assert_eq!(benchmark.frequency(), Some(Duration::days(7)));
        assert_eq!(benchmark.after_benchmark_macros(), &["no-op2".to_string()]);
    }

    #[test]
    fn test_zero_runs_rejected() {
        let d = descriptor(&[("data-source", "foo"), ("query-names", "q1"), ("runs", "0")]);
        let err = build_benchmark("c", "seq", "env", &d, Vec::new()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { ref key, .. } if key == "runs"));

        let err = BenchmarkBuilder::new("c", "seq", Vec::new())
            .with_concurrency(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { ref key, .. } if key == "concurrency"));
    }

    #[test]
    fn test_non_reserved_variables() {
        let d = descriptor(&[
            ("data-source", "foo"),
            ("query-names", "q1"),
            ("runs", "1"),
            ("size", "1GB"),
            ("format", "orc"),
        ]);
        let benchmark = build_benchmark("m", "seq", "env", &d, Vec::new()).unwrap();

        let variables = benchmark.non_reserved_variables();
        let names: Vec<&str> = variables.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["size", "format"]);
    }

    #[test]
    fn test_with_unique_name_keeps_fields() {
        let d = descriptor(&[("data-source", "foo"), ("query-names", "q1")]);
        let benchmark = build_benchmark("simple", "seq", "env", &d, Vec::new()).unwrap();
        let named = benchmark.clone().with_unique_name("simple_1".to_string());

        assert_eq!(named.unique_name(), Some("simple_1"));
        assert_eq!(named.name(), benchmark.name());
        assert_eq!(named.variables(), benchmark.variables());
    }

    #[test]
    fn test_json_frequency_in_days() {
        let d = descriptor(&[("data-source", "foo"), ("query-names", "q1"), ("frequency", "2")]);
        let benchmark = build_benchmark("c", "seq", "env", &d, Vec::new()).unwrap();
        let json = serde_json::to_value(&benchmark).unwrap();

        assert_eq!(json["frequency"], serde_json::json!(2));
        assert_eq!(json["data-source"], serde_json::json!("foo"));
        assert!(json.get("unique-name").is_none());
    }
}
