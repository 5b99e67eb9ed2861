//! @ai:module:intent Drop benchmarks that ran successfully within their frequency
//! @ai:module:layer application
//! @ai:module:public_api filter_fresh, FreshnessOutcome
//! @ai:module:stateless true

use crate::benchmark::Benchmark;
use crate::error::{LoadError, Result};
use crate::service::client::{ResultsServiceTrait, EXECUTION_AGES_PATH};

/// @ai:intent Benchmarks split by whether they still need to run
#[derive(Debug, Default)]
pub struct FreshnessOutcome {
    pub kept: Vec<Benchmark>,
    pub fresh: Vec<Benchmark>,
}

/// @ai:intent Partition benchmarks into kept and recently tested
/// @ai:pre every benchmark with a frequency has a unique name
/// @ai:post kept preserves input order; fresh iff age <= frequency
/// @ai:effects network
pub async fn filter_fresh<S: ResultsServiceTrait>(
    service: &S,
    benchmarks: Vec<Benchmark>,
) -> Result<FreshnessOutcome> {
    let unique_names: Vec<String> = benchmarks
        .iter()
        .filter(|benchmark| benchmark.frequency().is_some())
        .map(|benchmark| {
            benchmark
                .unique_name()
                .map(str::to_string)
                .ok_or_else(|| {
                    LoadError::InvariantViolation(format!(
                        "benchmark {} has no unique name",
                        benchmark.name()
                    ))
                })
        })
        .collect::<Result<_>>()?;

    if unique_names.is_empty() {
        return Ok(FreshnessOutcome {
            kept: benchmarks,
            fresh: Vec::new(),
        });
    }

    let ages = service.successful_execution_ages(&unique_names).await?;
    if ages.len() != unique_names.len() {
        return Err(LoadError::ServiceProtocolMismatch {
            endpoint: EXECUTION_AGES_PATH.to_string(),
            expected: unique_names.len(),
            actual: ages.len(),
        });
    }

    let mut ages = ages.into_iter();
    let mut outcome = FreshnessOutcome::default();

    for benchmark in benchmarks {
        let is_fresh = match benchmark.frequency() {
            Some(frequency) => ages.next().map(|age| age <= frequency).unwrap_or(false),
            None => false,
        };

        if is_fresh {
            tracing::debug!("Benchmark {} was tested recently, skipping", benchmark.name());
            outcome.fresh.push(benchmark);
        } else {
            outcome.kept.push(benchmark);
        }
    }

    Ok(outcome)
}
