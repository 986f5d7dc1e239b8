//! Provider service module
//!
//! - `types`: service and transport configuration values
//! - `version`: version ordering used to pick the default provider
//! - `cache`: concurrent service cache with default / versioned slots
//! - `weight`: server address weights kept in sync with the registry
//! - `factory`: publish / unpublish orchestration

pub mod cache;
pub mod factory;
pub mod types;
pub mod version;
pub mod weight;

pub use cache::ServiceCache;
pub use factory::{ServiceProvider, ServiceProviderBuilder};
pub use types::{ServerConfig, ServiceConfig, service_key};
pub use version::compare_versions;
pub use weight::WeightTracker;
