//! @ai:module:intent Benchmark loading orchestration
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkLoader, SummaryTable

pub mod orchestrator;
pub mod summary;

pub use orchestrator::BenchmarkLoader;
pub use summary::SummaryTable;
