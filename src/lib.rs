//! @ai:module:intent Benchmark definition resolver library
//! @ai:module:layer application
//! @ai:module:public_api config, error, resource, definition, benchmark, filter, service, loader

pub mod benchmark;
pub mod config;
pub mod definition;
pub mod error;
pub mod filter;
pub mod loader;
pub mod resource;
pub mod service;

pub use benchmark::{Benchmark, BenchmarkBuilder, Query, QueryLoaderTrait, SqlQueryLoader};
pub use config::{LoaderConfig, ServiceConfig};
pub use definition::{BenchmarkDescriptor, DescriptorFactory, ValueEvaluator};
pub use error::{LoadError, Result};
pub use loader::BenchmarkLoader;
pub use service::{OfflineResultsService, ResultsServiceClient, ResultsServiceTrait};
