#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use rpc_provider::{
    ProviderSettings, RegistryChangeTask, RegistryError, RegistryManager, ServerConfig,
    ServiceChangeListener, ServiceConfig, TransportError, TransportServer,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    Register {
        url: String,
        group: String,
        address: String,
        weight: u32,
    },
    Unregister {
        url: String,
        group: String,
        address: String,
    },
    SetWeight {
        address: String,
        weight: u32,
    },
}

/// 内存注册中心，记录所有调用
#[derive(Debug, Default)]
pub struct FakeRegistry {
    pub calls: Mutex<Vec<RegistryCall>>,
    pub registered: Mutex<HashSet<(String, String)>>,
    pub fail_register_address: Option<String>,
    pub fail_unregister: bool,
    pub fail_weight_address: Option<String>,
}

impl FakeRegistry {
    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn register_calls(&self) -> Vec<RegistryCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, RegistryCall::Register { .. }))
            .collect()
    }

    pub fn is_registered(&self, url: &str, address: &str) -> bool {
        self.registered
            .lock()
            .unwrap()
            .contains(&(url.to_string(), address.to_string()))
    }
}

#[async_trait]
impl RegistryManager for FakeRegistry {
    async fn register_service(
        &self,
        url: &str,
        group: &str,
        address: &str,
        weight: u32,
    ) -> Result<(), RegistryError> {
        if self.fail_register_address.as_deref() == Some(address) {
            return Err(RegistryError::Unavailable(format!("cannot reach registry for {address}")));
        }
        self.calls.lock().unwrap().push(RegistryCall::Register {
            url: url.to_string(),
            group: group.to_string(),
            address: address.to_string(),
            weight,
        });
        self.registered
            .lock()
            .unwrap()
            .insert((url.to_string(), address.to_string()));
        Ok(())
    }

    async fn unregister_service(
        &self,
        url: &str,
        group: &str,
        address: &str,
    ) -> Result<(), RegistryError> {
        if self.fail_unregister {
            return Err(RegistryError::Unavailable("registry down".to_string()));
        }
        let removed = self
            .registered
            .lock()
            .unwrap()
            .remove(&(url.to_string(), address.to_string()));
        if !removed {
            return Err(RegistryError::NotRegistered {
                url: url.to_string(),
                address: address.to_string(),
            });
        }
        self.calls.lock().unwrap().push(RegistryCall::Unregister {
            url: url.to_string(),
            group: group.to_string(),
            address: address.to_string(),
        });
        Ok(())
    }

    async fn set_server_weight(&self, address: &str, weight: u32) -> Result<(), RegistryError> {
        if self.fail_weight_address.as_deref() == Some(address) {
            return Err(RegistryError::Rejected {
                url: address.to_string(),
                reason: "weight locked".to_string(),
            });
        }
        self.calls.lock().unwrap().push(RegistryCall::SetWeight {
            address: address.to_string(),
            weight,
        });
        Ok(())
    }
}

/// 按协议匹配的传输服务器
#[derive(Debug)]
pub struct FakeServer {
    pub protocol: String,
    pub port: u16,
    pub fail: bool,
    pub added: AtomicUsize,
}

impl FakeServer {
    pub fn new(protocol: &str, port: u16) -> Self {
        Self {
            protocol: protocol.to_string(),
            port,
            fail: false,
            added: AtomicUsize::new(0),
        }
    }

    pub fn failing(protocol: &str, port: u16) -> Self {
        Self {
            fail: true,
            ..Self::new(protocol, port)
        }
    }

    pub fn added(&self) -> usize {
        self.added.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransportServer for FakeServer {
    fn support(&self, server_config: &ServerConfig) -> bool {
        server_config.protocol == self.protocol
    }

    async fn add_service(&self, config: &ServiceConfig) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::Rejected {
                url: config.url.clone(),
                reason: "port in use".to_string(),
            });
        }
        self.added.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn registry_url(&self, url: &str) -> String {
        url.to_string()
    }

    fn port(&self) -> u16 {
        self.port
    }
}

#[derive(Debug, Default)]
pub struct RecordingListener {
    pub published: AtomicUsize,
    pub unpublished: AtomicUsize,
}

#[async_trait]
impl ServiceChangeListener for RecordingListener {
    async fn notify_service_published(&self, _config: &ServiceConfig) {
        self.published.fetch_add(1, Ordering::SeqCst);
    }

    async fn notify_service_unpublished(&self, _config: &ServiceConfig) {
        self.unpublished.fetch_add(1, Ordering::SeqCst);
    }
}

/// 记录启动次数，直到收到关闭信号
#[derive(Debug, Default)]
pub struct CountingTask {
    pub runs: Arc<AtomicUsize>,
}

#[async_trait]
impl RegistryChangeTask for CountingTask {
    async fn run(&self, shutdown: CancellationToken) {
        self.runs.fetch_add(1, Ordering::SeqCst);
        shutdown.cancelled().await;
    }
}

pub fn settings() -> ProviderSettings {
    ProviderSettings {
        group: "black".to_string(),
        local_ip: "10.0.0.1".to_string(),
        weight: 5,
        ..Default::default()
    }
}

pub fn service(url: &str, version: &str) -> ServiceConfig {
    ServiceConfig::new(url, ServerConfig::default()).with_version(version)
}
