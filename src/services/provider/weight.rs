use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::Result;
use crate::services::registry::RegistryManager;

#[derive(Debug, Clone)]
struct AddressWeight {
    weight: u32,
    // 在该地址上已注册的注册中心 url
    services: HashSet<String>,
}

/// 服务器地址 -> 权重，所有在同一地址发布的服务共享一个条目
#[derive(Debug, Clone, Default)]
pub struct WeightTracker {
    weights: Arc<DashMap<String, AddressWeight>>,
}

impl WeightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录某个服务在地址上注册成功
    pub fn record(&self, address: &str, registry_url: &str, weight: u32) {
        self.weights
            .entry(address.to_string())
            .and_modify(|entry| {
                entry.weight = weight;
                entry.services.insert(registry_url.to_string());
            })
            .or_insert_with(|| AddressWeight {
                weight,
                services: HashSet::from([registry_url.to_string()]),
            });
    }

    /// 服务从地址上注销；地址上没有服务时移除条目，返回是否移除
    pub fn release(&self, address: &str, registry_url: &str) -> bool {
        if let Some(mut entry) = self.weights.get_mut(address) {
            entry.services.remove(registry_url);
        }

        let removed = self
            .weights
            .remove_if(address, |_, entry| entry.services.is_empty())
            .is_some();
        if removed {
            tracing::debug!(address = %address, "Last service released, removed address weight");
        }
        removed
    }

    /// 只更新本地记录，不调用注册中心。地址未被跟踪时返回 false
    pub fn update_local(&self, address: &str, weight: u32) -> bool {
        match self.weights.get_mut(address) {
            Some(mut entry) => {
                entry.weight = weight;
                true
            }
            None => false,
        }
    }

    pub fn remove_address(&self, address: &str) -> bool {
        self.weights.remove(address).is_some()
    }

    pub fn weight(&self, address: &str) -> Option<u32> {
        self.weights.get(address).map(|entry| entry.weight)
    }

    pub fn get(&self) -> HashMap<String, u32> {
        self.weights
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().weight))
            .collect()
    }

    /// 按地址顺序逐个更新注册中心和本地权重，遇到第一个错误即停止，已更新的不回滚
    pub async fn set_all(&self, registry: &dyn RegistryManager, weight: u32) -> Result<()> {
        let mut addresses: Vec<String> = self
            .weights
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        addresses.sort();

        for address in addresses {
            tracing::info!(address = %address, weight = weight, "Setting server weight");
            registry.set_server_weight(&address, weight).await?;
            self.update_local(&address, weight);
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_shared_by_services() {
        let tracker = WeightTracker::new();
        tracker.record("10.0.0.1:4040", "svc.Foo", 1);
        tracker.record("10.0.0.1:4040", "svc.Bar", 3);

        assert_eq!(tracker.weight("10.0.0.1:4040"), Some(3));
        assert_eq!(tracker.len(), 1);

        assert!(!tracker.release("10.0.0.1:4040", "svc.Foo"));
        assert_eq!(tracker.weight("10.0.0.1:4040"), Some(3));

        assert!(tracker.release("10.0.0.1:4040", "svc.Bar"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_release_unknown_address() {
        let tracker = WeightTracker::new();
        assert!(!tracker.release("10.0.0.1:4040", "svc.Foo"));
    }

    #[test]
    fn test_update_local_only_tracked() {
        let tracker = WeightTracker::new();
        tracker.record("10.0.0.1:4040", "svc.Foo", 1);

        assert!(tracker.update_local("10.0.0.1:4040", 0));
        assert!(!tracker.update_local("10.0.0.2:4040", 7));
        assert_eq!(tracker.get(), HashMap::from([("10.0.0.1:4040".to_string(), 0)]));
    }
}
