use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// 服务期望使用的传输层配置，由各个传输服务器自行判断是否支持
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub protocol: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            protocol: "default".to_string(),
            port: 4040,
        }
    }
}

/// 一个可发布的服务实现
#[derive(Debug)]
pub struct ServiceConfig {
    pub url: String,
    pub version: String,
    /// 由 `add_service` 根据进程配置写入，调用方的值会被覆盖
    pub group: String,
    pub server_config: ServerConfig,
    published: AtomicBool,
}

impl ServiceConfig {
    pub fn new(url: impl Into<String>, server_config: ServerConfig) -> Self {
        Self {
            url: url.into(),
            version: String::new(),
            group: String::new(),
            server_config,
            published: AtomicBool::new(false),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// 版本为空或只含空白时视为默认版本
    pub fn has_version(&self) -> bool {
        !self.version.trim().is_empty()
    }

    pub fn is_published(&self) -> bool {
        self.published.load(Ordering::Acquire)
    }

    pub(crate) fn set_published(&self, published: bool) {
        self.published.store(published, Ordering::Release);
    }

    /// 该配置在缓存中的版本槽位键
    pub fn cache_key(&self) -> String {
        service_key(&self.url, &self.version)
    }
}

impl fmt::Display for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ServiceConfig[url={}, version={}, group={}, protocol={}, port={}, published={}]",
            self.url,
            self.version,
            self.group,
            self.server_config.protocol,
            self.server_config.port,
            self.is_published()
        )
    }
}

/// 带版本的缓存键：无版本时为 `url`，否则为 `url_version`
pub fn service_key(url: &str, version: &str) -> String {
    if version.trim().is_empty() {
        url.to_string()
    } else {
        format!("{url}_{version}")
    }
}
