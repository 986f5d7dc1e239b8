pub mod provider;
pub mod registry;
pub mod transport;

pub use provider::{ServerConfig, ServiceConfig, ServiceProvider};
pub use registry::{RegistryManager, ServiceChangeListener};
pub use transport::TransportServer;
