use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use super::types::ServiceConfig;
use super::version::compare_versions;

/// 缓存键 -> 服务配置。默认槽位 `url` 与版本槽位 `url_version` 共享同一个配置
#[derive(Debug, Clone, Default)]
pub struct ServiceCache {
    services: Arc<DashMap<String, Arc<ServiceConfig>>>,
}

impl ServiceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入缓存并决定默认版本
    pub fn insert(&self, config: ServiceConfig) -> Arc<ServiceConfig> {
        let config = Arc::new(config);

        if !config.has_version() {
            self.services.insert(config.url.clone(), config.clone());
            return config;
        }

        // 先写版本槽位，再单独锁定默认槽位，避免同一分片上持有两个写锁
        self.services.insert(config.cache_key(), config.clone());

        match self.services.entry(config.url.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(config.clone());
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                // 无版本的默认服务一旦存在就不会被带版本的服务覆盖
                if current.has_version()
                    && compare_versions(&current.version, &config.version) == Ordering::Less
                {
                    tracing::info!(
                        url = %config.url,
                        previous_version = %current.version,
                        new_version = %config.version,
                        "Replacing default provider with newer version"
                    );
                    slot.insert(config.clone());
                }
            }
        }

        config
    }

    pub fn get(&self, key: &str) -> Option<Arc<ServiceConfig>> {
        self.services.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.services.contains_key(key)
    }

    /// 是否存在任何属于该 url 的缓存项
    pub fn contains_url(&self, url: &str) -> bool {
        self.services.iter().any(|entry| entry.value().url == url)
    }

    /// 所有属于该 url 的缓存项快照（键, 配置）
    pub fn matching(&self, url: &str) -> Vec<(String, Arc<ServiceConfig>)> {
        self.services
            .iter()
            .filter(|entry| entry.value().url == url)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn entries(&self) -> Vec<(String, Arc<ServiceConfig>)> {
        self.services
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn snapshot(&self) -> HashMap<String, Arc<ServiceConfig>> {
        self.entries().into_iter().collect()
    }

    /// 删除所有指向该 url 的键，返回删除的数量
    pub fn remove_url(&self, url: &str) -> usize {
        let before = self.services.len();
        self.services.retain(|_, config| config.url != url);
        before.saturating_sub(self.services.len())
    }

    pub fn clear(&self) {
        self.services.clear();
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
