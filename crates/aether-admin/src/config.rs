//! 配置管理
//!
//! 从 TOML 文件和 `AETHER_` 前缀的环境变量加载配置，验证后可保存回文件。
//! 环境变量用双下划线分隔层级，例如 `AETHER_SLA__TICK_INTERVAL_SECS=30`。

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "AETHER";

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    config: Arc<RwLock<AetherConfig>>,
    config_path: PathBuf,
    validator: ConfigValidator,
}

/// 系统完整配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AetherConfig {
    pub storage: StorageConfig,
    pub sla: SlaConfig,
    pub logging: LoggingConfig,
}

/// 存储配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 数据目录，状态文件保存在其中
    pub data_dir: String,
    /// 状态保存使用的键
    pub storage_key: String,
}

/// SLA 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaConfig {
    /// 剩余时间低于预算的这个比例时进入警告
    pub warning_ratio: f64,
    /// 监控周期（秒）
    pub tick_interval_secs: u64,
    /// 首次超时时自动标记为延误
    pub auto_mark_delayed: bool,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或过滤指令，RUST_LOG 优先
    pub level: String,
    /// 输出 JSON 格式
    pub json: bool,
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    field_path: &'static str,
    validator: fn(&AetherConfig) -> Result<()>,
}

impl ConfigManager {
    /// 创建配置管理器，配置文件不存在时使用默认值
    pub fn new(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref().to_path_buf();
        let validator = ConfigValidator::new();
        let config = Self::load_config(&config_path, ENV_PREFIX)?;
        validator.validate(&config)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
            validator,
        })
    }

    /// 按层级合并默认值、配置文件与环境变量
    fn load_config(config_path: &Path, env_prefix: &str) -> Result<AetherConfig> {
        let settings = Config::builder()
            .add_source(Config::try_from(&AetherConfig::default()).context("Failed to build default configuration")?)
            .add_source(File::from(config_path).required(false))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", config_path.display()))?;

        let config: AetherConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        info!("Configuration loaded from: {}", config_path.display());
        Ok(config)
    }

    /// 获取配置
    pub async fn get_config(&self) -> AetherConfig {
        self.config.read().await.clone()
    }

    /// 验证并替换配置，然后写回文件
    pub async fn update_config(&self, new_config: AetherConfig) -> Result<()> {
        self.validator.validate(&new_config)?;

        {
            let mut config = self.config.write().await;
            *config = new_config;
        }

        self.save_config().await?;
        info!("Configuration updated successfully");
        Ok(())
    }

    /// 保存配置到文件
    pub async fn save_config(&self) -> Result<()> {
        let config_str = {
            let config = self.config.read().await;
            toml::to_string_pretty(&*config).context("Failed to serialize configuration")?
        };

        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create configuration directory")?;
        }
        tokio::fs::write(&self.config_path, config_str)
            .await
            .context("Failed to write configuration file")?;

        info!("Configuration saved to: {}", self.config_path.display());
        Ok(())
    }

    /// 重新加载配置文件
    pub async fn reload_config(&self) -> Result<()> {
        let new_config = Self::load_config(&self.config_path, ENV_PREFIX)?;
        self.validator.validate(&new_config)?;
        *self.config.write().await = new_config;
        info!("Configuration reloaded");
        Ok(())
    }

    pub async fn validate_config(&self) -> Result<()> {
        let config = self.config.read().await;
        self.validator.validate(&config)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

impl ConfigValidator {
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "sla.warning_ratio",
                validator: |config| {
                    let ratio = config.sla.warning_ratio;
                    if ratio > 0.0 && ratio < 1.0 {
                        Ok(())
                    } else {
                        Err(anyhow::anyhow!("warning ratio must be between 0 and 1, got {}", ratio))
                    }
                },
            },
            ValidationRule {
                field_path: "sla.tick_interval_secs",
                validator: |config| {
                    if config.sla.tick_interval_secs == 0 {
                        Err(anyhow::anyhow!("tick interval cannot be 0"))
                    } else {
                        Ok(())
                    }
                },
            },
            ValidationRule {
                field_path: "storage.storage_key",
                validator: |config| {
                    let key = &config.storage.storage_key;
                    let valid = !key.is_empty()
                        && !key.starts_with('.')
                        && key
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
                    if valid {
                        Ok(())
                    } else {
                        Err(anyhow::anyhow!("invalid storage key: {:?}", key))
                    }
                },
            },
            ValidationRule {
                field_path: "storage.data_dir",
                validator: |config| {
                    if config.storage.data_dir.trim().is_empty() {
                        Err(anyhow::anyhow!("data directory cannot be empty"))
                    } else {
                        Ok(())
                    }
                },
            },
            ValidationRule {
                field_path: "logging.level",
                validator: |config| {
                    if config.logging.level.trim().is_empty() {
                        Err(anyhow::anyhow!("log level cannot be empty"))
                    } else {
                        Ok(())
                    }
                },
            },
        ];

        Self { validation_rules }
    }

    /// 验证配置
    pub fn validate(&self, config: &AetherConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if let Err(e) = (rule.validator)(config) {
                error!("Configuration validation failed for {}: {}", rule.field_path, e);
                return Err(e.context(format!("Invalid configuration value {}", rule.field_path)));
            }
        }
        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            storage_key: aether_store::DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            warning_ratio: aether_workflow::sla::DEFAULT_WARNING_RATIO,
            tick_interval_secs: 60,
            auto_mark_delayed: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigManager::load_config(&dir.path().join("missing.toml"), "AETHER_TEST_MISSING").unwrap();
        assert_eq!(config, AetherConfig::default());
        assert_eq!(config.storage.storage_key, "aether_db");
        assert_eq!(config.sla.tick_interval_secs, 60);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aether.toml");
        std::fs::write(&path, "[sla]\nwarning_ratio = 0.25\nauto_mark_delayed = true\n").unwrap();

        let config = ConfigManager::load_config(&path, "AETHER_TEST_FILE").unwrap();
        assert_eq!(config.sla.warning_ratio, 0.25);
        assert!(config.sla.auto_mark_delayed);
        assert_eq!(config.sla.tick_interval_secs, 60);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aether.toml");
        std::fs::write(&path, "[sla]\ntick_interval_secs = 30\n").unwrap();

        std::env::set_var("AETHER_TEST_ENV_SLA__TICK_INTERVAL_SECS", "15");
        let config = ConfigManager::load_config(&path, "AETHER_TEST_ENV").unwrap();
        std::env::remove_var("AETHER_TEST_ENV_SLA__TICK_INTERVAL_SECS");

        assert_eq!(config.sla.tick_interval_secs, 15);
    }

    #[test]
    fn test_validation_rules() {
        let validator = ConfigValidator::new();
        assert!(validator.validate(&AetherConfig::default()).is_ok());

        let mut config = AetherConfig::default();
        config.sla.warning_ratio = 1.5;
        assert!(validator.validate(&config).is_err());

        let mut config = AetherConfig::default();
        config.sla.tick_interval_secs = 0;
        assert!(validator.validate(&config).is_err());

        let mut config = AetherConfig::default();
        config.storage.storage_key = "../escape".to_string();
        assert!(validator.validate(&config).is_err());
    }

    #[tokio::test]
    async fn test_update_saves_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("aether.toml");
        let manager = ConfigManager::new(&path).unwrap();

        let mut config = manager.get_config().await;
        config.logging.json = true;
        manager.update_config(config.clone()).await.unwrap();

        let saved: AetherConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, config);

        let mut invalid = config;
        invalid.sla.tick_interval_secs = 0;
        assert!(manager.update_config(invalid).await.is_err());
        assert!(manager.get_config().await.logging.json);
    }
}
