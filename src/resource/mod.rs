//! @ai:module:intent Location resolution for benchmark and query files
//! @ai:module:layer infrastructure
//! @ai:module:public_api FileReader, Resource, Location

pub mod reader;

pub use reader::{relative_path, FileReader, Location, Resource};
