//! @ai:module:intent Results service integration
//! @ai:module:layer infrastructure
//! @ai:module:public_api ResultsServiceTrait, ResultsServiceClient, OfflineResultsService, assign_unique_names

pub mod client;
pub mod uniqueness;

pub use client::{OfflineResultsService, ResultsServiceClient, ResultsServiceTrait, UniqueNameRequestItem};
pub use uniqueness::assign_unique_names;
