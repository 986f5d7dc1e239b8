use async_trait::async_trait;

use crate::error::TransportError;
use crate::services::provider::{ServerConfig, ServiceConfig};

/// 传输层服务器，一个进程内可以同时运行多个
#[async_trait]
pub trait TransportServer: Send + Sync {
    /// 是否能承载该传输配置
    fn support(&self, server_config: &ServerConfig) -> bool;

    /// 开始在该服务器上提供服务
    async fn add_service(&self, config: &ServiceConfig) -> Result<(), TransportError>;

    /// 服务在注册中心中使用的 url
    fn registry_url(&self, url: &str) -> String;

    fn port(&self) -> u16;
}
