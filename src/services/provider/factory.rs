use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use super::cache::ServiceCache;
use super::types::ServiceConfig;
use super::weight::WeightTracker;
use crate::config::{ConfigManager, ENV_DEV, KEY_NOTIFY_ENABLE};
use crate::error::{RegistryError, Result};
use crate::services::registry::{
    RegistryChangeTask, RegistryEvent, RegistryEventListener, RegistryListenerBootstrap,
    RegistryManager, ServiceChangeListener,
};
use crate::services::transport::TransportServer;

/// 服务提供方：本地服务缓存、发布/取消发布、权重表
pub struct ServiceProvider {
    cache: ServiceCache,
    weights: WeightTracker,
    config: Arc<dyn ConfigManager>,
    registry: Arc<dyn RegistryManager>,
    servers: Vec<Arc<dyn TransportServer>>,
    change_listener: Option<Arc<dyn ServiceChangeListener>>,
    listener_bootstrap: RegistryListenerBootstrap,
    // 串行化注册中心写入
    register_lock: Mutex<()>,
    default_notify_enable: bool,
}

pub struct ServiceProviderBuilder {
    config: Arc<dyn ConfigManager>,
    registry: Arc<dyn RegistryManager>,
    servers: Vec<Arc<dyn TransportServer>>,
    change_listener: Option<Arc<dyn ServiceChangeListener>>,
    change_task: Option<Arc<dyn RegistryChangeTask>>,
    weights: WeightTracker,
}

impl ServiceProviderBuilder {
    pub fn transport(mut self, server: Arc<dyn TransportServer>) -> Self {
        self.servers.push(server);
        self
    }

    pub fn change_listener(mut self, listener: Arc<dyn ServiceChangeListener>) -> Self {
        self.change_listener = Some(listener);
        self
    }

    pub fn registry_change_task(mut self, task: Arc<dyn RegistryChangeTask>) -> Self {
        self.change_task = Some(task);
        self
    }

    /// 使用内置监听器消费注册中心事件
    pub fn registry_events(self, events: mpsc::Receiver<RegistryEvent>) -> Self {
        let listener = RegistryEventListener::new(events, self.weights.clone());
        self.registry_change_task(Arc::new(listener))
    }

    pub fn build(self) -> ServiceProvider {
        let default_notify_enable = !self.config.env().eq_ignore_ascii_case(ENV_DEV);

        ServiceProvider {
            cache: ServiceCache::new(),
            weights: self.weights,
            config: self.config,
            registry: self.registry,
            servers: self.servers,
            change_listener: self.change_listener,
            listener_bootstrap: RegistryListenerBootstrap::new(self.change_task),
            register_lock: Mutex::new(()),
            default_notify_enable,
        }
    }
}

// 同一个配置可能同时占据默认槽位和版本槽位，只处理一次
fn distinct(entries: Vec<(String, Arc<ServiceConfig>)>) -> Vec<Arc<ServiceConfig>> {
    let mut configs: Vec<Arc<ServiceConfig>> = Vec::with_capacity(entries.len());
    for (_, config) in entries {
        if !configs.iter().any(|c| Arc::ptr_eq(c, &config)) {
            configs.push(config);
        }
    }
    configs
}

impl ServiceProvider {
    pub fn builder(
        config: Arc<dyn ConfigManager>,
        registry: Arc<dyn RegistryManager>,
    ) -> ServiceProviderBuilder {
        ServiceProviderBuilder {
            config,
            registry,
            servers: Vec::new(),
            change_listener: None,
            change_task: None,
            weights: WeightTracker::new(),
        }
    }

    /// 加入本地服务缓存，group 总是取自进程配置
    pub fn add_service(&self, mut config: ServiceConfig) -> Arc<ServiceConfig> {
        config.group = self.config.group();
        tracing::info!(service = %config, "Adding service");
        self.cache.insert(config)
    }

    pub fn service_config(&self, key: &str) -> Option<Arc<ServiceConfig>> {
        self.cache.get(key)
    }

    pub fn all_services(&self) -> HashMap<String, Arc<ServiceConfig>> {
        self.cache.snapshot()
    }

    fn notify_enabled(&self) -> bool {
        self.config.bool_value(KEY_NOTIFY_ENABLE, self.default_notify_enable)
    }

    fn server_address(&self, server: &dyn TransportServer) -> String {
        format!("{}:{}", self.config.local_ip(), server.port())
    }

    fn supporting_servers(&self, config: &ServiceConfig) -> Vec<Arc<dyn TransportServer>> {
        self.servers
            .iter()
            .filter(|server| server.support(&config.server_config))
            .cloned()
            .collect()
    }

    pub async fn publish_service(&self, config: &ServiceConfig) -> Result<()> {
        let existing = self.cache.contains_url(&config.url);
        tracing::info!(
            service = %config,
            existing_service = existing,
            "Trying to publish service to registry"
        );
        if !existing {
            return Ok(());
        }

        let mut register_count = 0;
        for server in self.supporting_servers(config) {
            // 失败立即返回，已注册的服务器不回滚
            server.add_service(config).await?;
            self.register_address(server.as_ref(), config).await?;
            register_count += 1;
        }

        if register_count == 0 {
            tracing::debug!(url = %config.url, "No transport server supports service");
            return Ok(());
        }

        if self.notify_enabled() {
            if let Some(listener) = &self.change_listener {
                listener.notify_service_published(config).await;
            }
        }
        config.set_published(true);

        Ok(())
    }

    async fn register_address(
        &self,
        server: &dyn TransportServer,
        config: &ServiceConfig,
    ) -> Result<()> {
        let _guard = self.register_lock.lock().await;

        let registry_url = server.registry_url(&config.url);
        let address = self.server_address(server);
        let weight = self.config.weight();
        tracing::info!(
            url = %registry_url,
            port = server.port(),
            group = %config.group,
            address = %address,
            weight = weight,
            "Publishing service to registry"
        );

        self.registry
            .register_service(&registry_url, &config.group, &address, weight)
            .await?;
        self.weights.record(&address, &registry_url, weight);
        self.listener_bootstrap.ensure_started();

        Ok(())
    }

    /// 发布该 url 下所有缓存的服务；url 本身不在缓存中时什么都不做
    pub async fn publish_url(&self, url: &str) -> Result<()> {
        tracing::info!(url = %url, "Publishing service");
        if !self.cache.contains_key(url) {
            return Ok(());
        }
        for config in distinct(self.cache.matching(url)) {
            self.publish_service(&config).await?;
        }
        Ok(())
    }

    pub async fn unpublish_service(&self, config: &ServiceConfig) -> Result<()> {
        let existing = self.cache.contains_url(&config.url);
        tracing::info!(
            service = %config,
            existing_service = existing,
            "Trying to unpublish service from registry"
        );
        if !existing {
            return Ok(());
        }

        let was_published = config.is_published();
        let mut unregister_count = 0;
        let mut absent_count = 0;
        for server in self.supporting_servers(config) {
            let registry_url = server.registry_url(&config.url);
            let address = self.server_address(server.as_ref());
            match self
                .registry
                .unregister_service(&registry_url, &config.group, &address)
                .await
            {
                Ok(()) => {
                    self.weights.release(&address, &registry_url);
                    unregister_count += 1;
                }
                Err(RegistryError::NotRegistered { .. }) => {
                    tracing::debug!(
                        url = %registry_url,
                        address = %address,
                        "Service was never registered at address, skipping"
                    );
                    absent_count += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        // 其他版本可能已经注销了相同的 (url, address)，已发布的配置仍需标记为未发布
        if unregister_count == 0 && !(was_published && absent_count > 0) {
            return Ok(());
        }

        if self.notify_enabled() {
            if let Some(listener) = &self.change_listener {
                listener.notify_service_unpublished(config).await;
            }
        }
        config.set_published(false);
        tracing::info!(service = %config, "Unpublished service from registry");

        Ok(())
    }

    pub async fn unpublish_url(&self, url: &str) -> Result<()> {
        tracing::info!(url = %url, "Unpublishing service");
        if !self.cache.contains_key(url) {
            return Ok(());
        }
        for config in distinct(self.cache.matching(url)) {
            self.unpublish_service(&config).await?;
        }
        Ok(())
    }

    /// 先取消发布再从缓存中删除该 url 的所有键
    pub async fn remove_service(&self, url: &str) -> Result<()> {
        tracing::info!(url = %url, "Removing service");
        for config in distinct(self.cache.matching(url)) {
            self.unpublish_service(&config).await?;
        }
        let removed = self.cache.remove_url(url);
        tracing::debug!(url = %url, removed_keys = removed, "Removed service keys from cache");
        Ok(())
    }

    pub async fn remove_all_services(&self) -> Result<()> {
        tracing::info!("Removing all services");
        for config in distinct(self.cache.entries()) {
            self.unpublish_service(&config).await?;
        }
        self.cache.clear();
        Ok(())
    }

    pub async fn publish_all_services(&self) -> Result<()> {
        tracing::info!("Publishing all services");
        for config in distinct(self.cache.entries()) {
            self.publish_service(&config).await?;
        }
        Ok(())
    }

    pub async fn unpublish_all_services(&self) -> Result<()> {
        tracing::info!("Unpublishing all services");
        for config in distinct(self.cache.entries()) {
            self.unpublish_service(&config).await?;
        }
        Ok(())
    }

    pub fn server_weights(&self) -> HashMap<String, u32> {
        self.weights.get()
    }

    pub async fn set_server_weight(&self, weight: u32) -> Result<()> {
        self.weights.set_all(self.registry.as_ref(), weight).await
    }

    pub fn is_registry_listener_started(&self) -> bool {
        self.listener_bootstrap.is_started()
    }

    /// 停止注册中心监听任务，由宿主进程在退出前调用
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down service provider");
        self.listener_bootstrap.shutdown().await;
    }
}
