//! @ai:module:intent Drive discovery, expansion, filtering and naming of benchmarks
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkLoader
//! @ai:module:stateless false

use crate::benchmark::{build_benchmark, natural_cmp, Benchmark, QueryLoaderTrait};
use crate::config::LoaderConfig;
use crate::definition::{yaml, DescriptorFactory};
use crate::error::{LoadError, Result};
use crate::filter::{benchmark_name, filter_fresh, ActiveVariablesFilter, FreshnessOutcome};
use crate::loader::summary::SummaryTable;
use crate::resource::{FileReader, Resource};
use crate::service::{assign_unique_names, ResultsServiceTrait};
use std::future::Future;
use tokio_util::sync::CancellationToken;

const BENCHMARK_FILE_PATTERN: &str = "**/*.yaml";

/// @ai:intent Loads the run set for one benchmark sequence
pub struct BenchmarkLoader<S, Q> {
    config: LoaderConfig,
    reader: FileReader,
    service: S,
    query_loader: Q,
    factory: DescriptorFactory,
}

impl<S: ResultsServiceTrait, Q: QueryLoaderTrait> BenchmarkLoader<S, Q> {
    /// @ai:intent Create a loader over an immutable configuration
    /// @ai:effects pure
    pub fn new(config: LoaderConfig, service: S, query_loader: Q) -> Self {
        let reader = FileReader::new(config.classpath_roots.clone());
        Self {
            config,
            reader,
            service,
            query_loader,
            factory: DescriptorFactory::new(),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// @ai:intent List benchmark files under the benchmarks directory
    /// @ai:effects fs:read
    pub fn find_benchmark_files(&self) -> Result<(Resource, Vec<Resource>)> {
        tracing::info!("Searching for benchmarks in {} ...", self.config.benchmarks_dir);

        let dir = self.reader.resolve(&self.config.benchmarks_dir)?;
        let files = self.reader.glob(&dir, BENCHMARK_FILE_PATTERN)?;
        for file in &files {
            tracing::info!("Benchmark found: {}", file.location());
        }

        Ok((dir, files))
    }

    /// @ai:intent Expand every active benchmark file, sorted by name, before any filtering by variables
    /// @ai:effects fs:read
    pub fn load_all_benchmarks(&self, sequence_id: &str) -> Result<Vec<Benchmark>> {
        let (dir, files) = self.find_benchmark_files()?;
        self.load_benchmark_files(&dir, &files, sequence_id)
    }

    /// @ai:intent Expand already discovered benchmark files without walking the directory again
    /// @ai:effects fs:read
    pub fn load_benchmark_files(&self, dir: &Resource, files: &[Resource], sequence_id: &str) -> Result<Vec<Benchmark>> {
        self.expand(dir, files, sequence_id, &CancellationToken::new())
    }

    /// @ai:intent Produce the benchmarks that should run for this sequence
    /// @ai:post result is in natural name order; every benchmark has a unique name
    /// @ai:effects fs:read, network
    pub async fn load(&self, sequence_id: &str, cancel: &CancellationToken) -> Result<Vec<Benchmark>> {
        let active_variables = ActiveVariablesFilter::parse(self.config.active_variables.as_deref())?;
        let all = self.expand_files(sequence_id, cancel)?;
        let total = all.len();
        tracing::debug!("All benchmarks: {:?}", all.iter().map(Benchmark::name).collect::<Vec<_>>());

        let (included, excluded): (Vec<Benchmark>, Vec<Benchmark>) =
            all.into_iter().partition(|benchmark| active_variables.matches(benchmark));

        let table = SummaryTable::new(included.iter().chain(&excluded));
        table.log("Excluded Benchmarks:", &excluded);
        check_cancelled(cancel)?;

        let included = cancellable(cancel, assign_unique_names(&self.service, included)).await?;

        let FreshnessOutcome { kept, fresh } = if self.config.frequency_check_enabled {
            let outcome = cancellable(cancel, filter_fresh(&self.service, included)).await?;
            table.log("Recently tested benchmarks:", &outcome.fresh);
            outcome
        } else {
            FreshnessOutcome {
                kept: included,
                fresh: Vec::new(),
            }
        };

        table.log("Selected Benchmarks:", &kept);

        if total != kept.len() + excluded.len() + fresh.len() {
            return Err(LoadError::InvariantViolation(format!(
                "{} benchmarks loaded but {} selected, {} excluded and {} recently tested",
                total,
                kept.len(),
                excluded.len(),
                fresh.len()
            )));
        }

        Ok(kept)
    }

    fn expand_files(&self, sequence_id: &str, cancel: &CancellationToken) -> Result<Vec<Benchmark>> {
        check_cancelled(cancel)?;
        let (dir, files) = self.find_benchmark_files()?;
        self.expand(&dir, &files, sequence_id, cancel)
    }

    fn expand(
        &self,
        dir: &Resource,
        files: &[Resource],
        sequence_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Benchmark>> {
        let mut benchmarks = Vec::new();
        for file in files {
            let name = benchmark_name(dir.path(), file.path());
            if !self.config.is_active_benchmark(&name) {
                continue;
            }

            check_cancelled(cancel)?;
            tracing::info!("Benchmark file to be read: {}", file.location());
            let loaded = self
                .load_file(&name, sequence_id, file)
                .map_err(|e| e.in_file(file.location()))?;
            benchmarks.extend(loaded);
        }

        benchmarks.sort_by(|a, b| natural_cmp(a.name(), b.name()));
        check_cancelled(cancel)?;
        Ok(benchmarks)
    }

    /// @ai:intent Turn one YAML file into its concrete benchmarks
    /// @ai:effects fs:read
    fn load_file(&self, name: &str, sequence_id: &str, file: &Resource) -> Result<Vec<Benchmark>> {
        let yaml = yaml::load_benchmark(file)?;
        let descriptors = self.factory.create_descriptors(&yaml)?;

        descriptors
            .iter()
            .map(|descriptor| {
                let queries = self.query_loader.load_from_files(&descriptor.query_names())?;
                build_benchmark(
                    name,
                    sequence_id,
                    &self.config.environment_name,
                    descriptor,
                    queries,
                )
            })
            .collect()
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(LoadError::Cancelled)
    } else {
        Ok(())
    }
}

/// @ai:intent Race a service call against cancellation
async fn cancellable<T>(cancel: &CancellationToken, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LoadError::Cancelled),
        result = call => result,
    }
}
