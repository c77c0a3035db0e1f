//! # Aether管理模块
//!
//! 提供配置管理、日志初始化和 SLA 监控等运维功能，
//! 并把它们与状态存储组装成可直接使用的系统。

pub mod config;
pub mod logging;
pub mod monitoring;

use aether_store::{FileKeyValueStore, NotificationSink, PersistenceAdapter, Store, TracingSink};
use anyhow::Result;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

pub use config::{AetherConfig, ConfigManager, ConfigValidator, LoggingConfig, SlaConfig, StorageConfig};
pub use logging::init_logging;
pub use monitoring::{SlaMonitor, TickReport};

/// 系统管理器
///
/// 按配置打开基于文件的状态存储，并负责启动 SLA 监控。
pub struct SystemManager {
    config_manager: Arc<ConfigManager>,
    store: Arc<Mutex<Store>>,
    sink: Arc<dyn NotificationSink>,
}

impl SystemManager {
    /// 加载配置并打开状态存储
    pub async fn new(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_manager = Arc::new(ConfigManager::new(config_path)?);
        Self::with_sink(config_manager, Arc::new(TracingSink)).await
    }

    pub async fn with_sink(config_manager: Arc<ConfigManager>, sink: Arc<dyn NotificationSink>) -> Result<Self> {
        let config = config_manager.get_config().await;
        let kv = FileKeyValueStore::new(&config.storage.data_dir);
        let persistence = PersistenceAdapter::new(Arc::new(kv), config.storage.storage_key.clone());
        let store = Store::open(persistence, sink.clone(), chrono::Utc::now());

        tracing::info!("State store opened in {}", config.storage.data_dir);
        Ok(Self {
            config_manager,
            store: Arc::new(Mutex::new(store)),
            sink,
        })
    }

    /// 启动后台 SLA 监控
    pub async fn start(&self) -> JoinHandle<()> {
        let config = self.config_manager.get_config().await;
        SlaMonitor::new(self.store.clone(), self.sink.clone(), &config.sla).start()
    }

    pub fn config_manager(&self) -> &Arc<ConfigManager> {
        &self.config_manager
    }

    pub fn store(&self) -> &Arc<Mutex<Store>> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_store::{Action, KeyValueStore, MemorySink, NewPatient};

    #[tokio::test]
    async fn test_system_manager_persists_to_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("aether.toml");
        let manager = Arc::new(ConfigManager::new(&config_path).unwrap());

        let mut config = manager.get_config().await;
        config.storage.data_dir = dir.path().join("data").display().to_string();
        manager.update_config(config).await.unwrap();

        let system = SystemManager::with_sink(manager, Arc::new(MemorySink::new())).await.unwrap();
        let changed = system
            .store()
            .lock()
            .unwrap()
            .dispatch(Action::AddPatient(NewPatient::new("Jane Doe", "Neurology", "Migraine")));
        assert!(changed);

        let kv = FileKeyValueStore::new(dir.path().join("data"));
        let raw = kv.get(aether_store::DEFAULT_STORAGE_KEY).unwrap().unwrap();
        assert!(raw.contains("Jane Doe"));
    }
}
