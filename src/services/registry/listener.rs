use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::services::provider::WeightTracker;

/// 注册中心事件通道容量
pub const REGISTRY_EVENT_CAPACITY: usize = 256;

/// 监听注册中心变更的后台任务，进程生命周期内最多启动一次
#[async_trait]
pub trait RegistryChangeTask: Send + Sync + 'static {
    async fn run(&self, shutdown: CancellationToken);
}

/// 注册中心推送过来的变更
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// 权重在外部被修改
    WeightChanged { address: String, weight: u32 },
    /// 地址在外部被摘除
    AddressRemoved { address: String },
}

/// 懒启动的注册中心监听器
pub struct RegistryListenerBootstrap {
    started: AtomicBool,
    task: Option<Arc<dyn RegistryChangeTask>>,
    task_tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl RegistryListenerBootstrap {
    pub fn new(task: Option<Arc<dyn RegistryChangeTask>>) -> Self {
        Self {
            started: AtomicBool::new(false),
            task,
            task_tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// 第一次调用时启动后台任务，返回本次调用是否真正启动了任务
    pub fn ensure_started(&self) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        match &self.task {
            Some(task) => {
                let task = task.clone();
                let shutdown = self.shutdown.clone();
                self.task_tracker.spawn(async move {
                    task.run(shutdown).await;
                    tracing::info!("Registry change listener stopped");
                });
                tracing::info!("Started registry change listener");
            }
            None => {
                tracing::debug!("No registry change task configured, skipping listener start");
            }
        }

        true
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// 通知后台任务退出并等待其结束
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;
    }
}

impl std::fmt::Debug for RegistryListenerBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryListenerBootstrap")
            .field("started", &self.is_started())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

/// 内置的变更任务：消费注册中心事件并同步本地权重表
#[derive(Debug)]
pub struct RegistryEventListener {
    events: Mutex<Option<mpsc::Receiver<RegistryEvent>>>,
    weights: WeightTracker,
}

impl RegistryEventListener {
    pub fn new(events: mpsc::Receiver<RegistryEvent>, weights: WeightTracker) -> Self {
        Self {
            events: Mutex::new(Some(events)),
            weights,
        }
    }

    /// 创建事件通道，发送端交给注册中心客户端
    pub fn channel() -> (mpsc::Sender<RegistryEvent>, mpsc::Receiver<RegistryEvent>) {
        mpsc::channel(REGISTRY_EVENT_CAPACITY)
    }

    fn apply(&self, event: RegistryEvent) {
        match event {
            RegistryEvent::WeightChanged { address, weight } => {
                if self.weights.update_local(&address, weight) {
                    tracing::info!(address = %address, weight = weight, "Applied registry weight change");
                } else {
                    tracing::debug!(address = %address, "Ignoring weight change for untracked address");
                }
            }
            RegistryEvent::AddressRemoved { address } => {
                if self.weights.remove_address(&address) {
                    tracing::warn!(address = %address, "Address removed by registry, dropped local weight");
                }
            }
        }
    }
}

#[async_trait]
impl RegistryChangeTask for RegistryEventListener {
    async fn run(&self, shutdown: CancellationToken) {
        let receiver = match self.events.lock() {
            Ok(mut events) => events.take(),
            Err(_) => None,
        };
        let Some(receiver) = receiver else {
            tracing::error!("Registry event receiver already consumed");
            return;
        };

        let mut events = ReceiverStream::new(receiver);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.next() => match event {
                    Some(event) => self.apply(event),
                    None => {
                        tracing::info!("Registry event stream closed");
                        break;
                    }
                },
            }
        }
    }
}
