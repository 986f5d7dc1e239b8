//! Registry collaborators
//!
//! - `RegistryManager`: the external directory the provider writes its addresses to
//! - `ServiceChangeListener`: optional observer of publish / unpublish
//! - `listener`: the background task that reacts to registry-driven changes

pub mod listener;

use async_trait::async_trait;

use crate::error::RegistryError;
use crate::services::provider::ServiceConfig;

pub use listener::{
    RegistryChangeTask, RegistryEvent, RegistryEventListener, RegistryListenerBootstrap,
};

/// 注册中心客户端（进程内单例）
#[async_trait]
pub trait RegistryManager: Send + Sync {
    /// 注册服务地址
    async fn register_service(
        &self,
        url: &str,
        group: &str,
        address: &str,
        weight: u32,
    ) -> Result<(), RegistryError>;

    /// 注销服务地址
    async fn unregister_service(
        &self,
        url: &str,
        group: &str,
        address: &str,
    ) -> Result<(), RegistryError>;

    /// 更新地址的负载均衡权重
    async fn set_server_weight(&self, address: &str, weight: u32) -> Result<(), RegistryError>;
}

/// 服务发布状态监听器，尽力通知，不返回错误
#[async_trait]
pub trait ServiceChangeListener: Send + Sync {
    async fn notify_service_published(&self, config: &ServiceConfig);

    async fn notify_service_unpublished(&self, config: &ServiceConfig);
}
