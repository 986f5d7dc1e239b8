use thiserror::Error;

/// 注册中心调用错误
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry unavailable: {0}")]
    Unavailable(String),

    #[error("Registry rejected write for {url}: {reason}")]
    Rejected { url: String, reason: String },

    #[error("Service {url} is not registered at {address}")]
    NotRegistered { url: String, address: String },

    #[error("Registry error: {0}")]
    Other(String),
}

/// 传输层服务器错误
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Transport rejected service {url}: {reason}")]
    Rejected { url: String, reason: String },

    #[error("Transport io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 服务发布错误，所有协作方错误都会包装成这个类型
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Registry failure: {0}")]
    Registry(#[from] RegistryError),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to read config from environment: {0}")]
    Env(#[from] envy::Error),
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;
