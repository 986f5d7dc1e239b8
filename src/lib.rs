//! Provider-side service registration and publication.
//!
//! Tracks locally exposed services, resolves the default version per url and
//! publishes service addresses to a registry across every transport server.

pub mod config;
pub mod error;
pub mod logging;
pub mod services;

pub use config::{ConfigManager, ProviderSettings};
pub use error::{ConfigError, RegistryError, Result, ServiceError, TransportError};
pub use services::provider::{
    ServerConfig, ServiceConfig, ServiceProvider, ServiceProviderBuilder, WeightTracker,
    service_key,
};
pub use services::registry::{
    RegistryChangeTask, RegistryEvent, RegistryEventListener, RegistryManager,
    ServiceChangeListener,
};
pub use services::transport::TransportServer;
