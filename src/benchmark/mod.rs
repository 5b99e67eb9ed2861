//! @ai:module:intent Concrete benchmarks, their queries and ordering
//! @ai:module:layer domain
//! @ai:module:public_api Benchmark, BenchmarkBuilder, Query, QueryLoaderTrait, SqlQueryLoader, natural_cmp

pub mod natural_order;
pub mod query_loader;
pub mod types;

pub use natural_order::natural_cmp;
pub use query_loader::{QueryLoaderTrait, SqlQueryLoader};
pub use types::{build_benchmark, Benchmark, BenchmarkBuilder, Query};
