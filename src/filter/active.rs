//! @ai:module:intent User-supplied benchmark selection predicates
//! @ai:module:layer domain
//! @ai:module:public_api benchmark_name, ActiveVariablesFilter
//! @ai:module:stateless true

use crate::benchmark::Benchmark;
use crate::error::{LoadError, Result};
use crate::resource::relative_path;
use regex::Regex;
use std::path::Path;

/// @ai:intent Derive a benchmark name from its file: relative path, no extension, `/`-separated
/// @ai:effects pure
pub fn benchmark_name(base: &Path, file: &Path) -> String {
    let relative = relative_path(base, file);
    match relative.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() && !stem.ends_with('/') => stem.to_string(),
        _ => relative,
    }
}

/// @ai:intent Keep benchmarks whose variables contain a match for every `key=regex` pair
#[derive(Debug, Clone, Default)]
pub struct ActiveVariablesFilter {
    patterns: Vec<(String, Regex)>,
}

impl ActiveVariablesFilter {
    /// @ai:intent Parse `k1=pattern1,k2=pattern2`; `None` or blank accepts everything
    /// @ai:effects pure
    pub fn parse(expression: Option<&str>) -> Result<Self> {
        let expression = match expression.map(str::trim) {
            Some(expression) if !expression.is_empty() => expression,
            _ => return Ok(Self::default()),
        };

        let patterns = expression
            .split(',')
            .map(|pair| {
                let (key, pattern) = pair.split_once('=').ok_or_else(|| {
                    LoadError::InvalidConfig(format!(
                        "active variable '{}' is not of the form key=regex",
                        pair
                    ))
                })?;
                let key = key.trim();
                let regex = Regex::new(pattern.trim()).map_err(|e| {
                    LoadError::InvalidConfig(format!("active variable {}: {}", key, e))
                })?;
                Ok::<_, LoadError>((key.to_string(), regex))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// @ai:intent Check whether a benchmark passes every pattern
    /// @ai:effects pure
    pub fn matches(&self, benchmark: &Benchmark) -> bool {
        self.patterns.iter().all(|(key, regex)| {
            benchmark
                .variables()
                .get(key)
                .map(|value| regex.is_match(value))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::BenchmarkBuilder;
    use crate::definition::Variables;

    fn benchmark(pairs: &[(&str, &str)]) -> Benchmark {
        let variables: Variables = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BenchmarkBuilder::new("b", "seq", Vec::new())
            .with_variables(variables)
            .build()
            .unwrap()
    }

    #[test]
    fn test_benchmark_name() {
        let base = Path::new("/bench");
        assert_eq!(
            benchmark_name(base, Path::new("/bench/simple-benchmark.yaml")),
            "simple-benchmark"
        );
        assert_eq!(
            benchmark_name(base, Path::new("/bench/tpch/q01.v2.yaml")),
            "tpch/q01.v2"
        );
        assert_eq!(benchmark_name(base, Path::new("/bench/.hidden")), ".hidden");
    }

    #[test]
    fn test_empty_filter_accepts_all() {
        let filter = ActiveVariablesFilter::parse(None).unwrap();
        assert!(filter.is_empty());
        assert!(filter.matches(&benchmark(&[])));
        assert!(ActiveVariablesFilter::parse(Some("  ")).unwrap().is_empty());
    }

    #[test]
    fn test_pattern_found_anywhere_in_value() {
        let filter = ActiveVariablesFilter::parse(Some("format=(orc)|(txt)")).unwrap();
        assert!(filter.matches(&benchmark(&[("format", "orc")])));
        assert!(filter.matches(&benchmark(&[("format", "txt")])));
        assert!(!filter.matches(&benchmark(&[("format", "parquet")])));

        let partial = ActiveVariablesFilter::parse(Some("format=(rc)|(tx)")).unwrap();
        assert!(partial.matches(&benchmark(&[("format", "orc")])));
        assert!(partial.matches(&benchmark(&[("format", "txt")])));
        assert!(!partial.matches(&benchmark(&[("format", "parquet")])));

        let anchored = ActiveVariablesFilter::parse(Some("format=^rc$")).unwrap();
        assert!(!anchored.matches(&benchmark(&[("format", "orc")])));
    }

    #[test]
    fn test_whitespace_around_pair_is_ignored() {
        let filter = ActiveVariablesFilter::parse(Some(" quarantine = false , size= 1GB")).unwrap();
        assert!(filter.matches(&benchmark(&[("quarantine", "false"), ("size", "1GB")])));
        assert!(!filter.matches(&benchmark(&[("quarantine", "true"), ("size", "1GB")])));
    }

    #[test]
    fn test_every_key_must_exist_and_match() {
        let filter = ActiveVariablesFilter::parse(Some("format=orc,size=1GB")).unwrap();
        assert!(filter.matches(&benchmark(&[("format", "orc"), ("size", "1GB")])));
        assert!(!filter.matches(&benchmark(&[("format", "orc"), ("size", "2GB")])));
        assert!(!filter.matches(&benchmark(&[("format", "orc")])));
    }

    #[test]
    fn test_malformed_filter_is_config_error() {
        assert!(matches!(
            ActiveVariablesFilter::parse(Some("format")),
            Err(LoadError::InvalidConfig(_))
        ));
        assert!(matches!(
            ActiveVariablesFilter::parse(Some("format=(orc")),
            Err(LoadError::InvalidConfig(_))
        ));
    }
}
