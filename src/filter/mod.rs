//! @ai:module:intent Benchmark selection: user predicates and freshness
//! @ai:module:layer application
//! @ai:module:public_api ActiveVariablesFilter, benchmark_name, filter_fresh, FreshnessOutcome

pub mod active;
pub mod freshness;

pub use active::{benchmark_name, ActiveVariablesFilter};
pub use freshness::{filter_fresh, FreshnessOutcome};
