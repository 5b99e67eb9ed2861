//! @ai:module:intent Attach service-assigned unique names to benchmarks
//! @ai:module:layer application
//! @ai:module:public_api assign_unique_names
//! @ai:module:stateless true

use crate::benchmark::Benchmark;
use crate::error::{LoadError, Result};
use crate::service::client::{ResultsServiceTrait, UniqueNameRequestItem, UNIQUE_NAMES_PATH};

/// @ai:intent Ask the service for unique names and attach them by index
/// @ai:post output order equals input order; an empty input makes no call
/// @ai:effects network
pub async fn assign_unique_names<S: ResultsServiceTrait>(
    service: &S,
    benchmarks: Vec<Benchmark>,
) -> Result<Vec<Benchmark>> {
    if benchmarks.is_empty() {
        return Ok(benchmarks);
    }

    let items: Vec<UniqueNameRequestItem> = benchmarks
        .iter()
        .map(|benchmark| UniqueNameRequestItem {
            name: benchmark.name().to_string(),
            variables: benchmark.non_reserved_variables(),
        })
        .collect();

    let names = service.generate_unique_names(&items).await?;
    if names.len() != benchmarks.len() {
        return Err(LoadError::ServiceProtocolMismatch {
            endpoint: UNIQUE_NAMES_PATH.to_string(),
            expected: benchmarks.len(),
            actual: names.len(),
        });
    }

    Ok(benchmarks
        .into_iter()
        .zip(names)
        .map(|(benchmark, name)| benchmark.with_unique_name(name))
        .collect())
}
