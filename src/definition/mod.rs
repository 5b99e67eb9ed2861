//! @ai:module:intent Turn benchmark YAML files into evaluated descriptors
//! @ai:module:layer domain
//! @ai:module:public_api BenchmarkDescriptor, DescriptorFactory, ValueEvaluator, Variables
//! @ai:module:stateless true

pub mod descriptor;
pub mod template;
pub mod yaml;

pub use descriptor::{BenchmarkDescriptor, DescriptorFactory, Variables};
pub use template::ValueEvaluator;
