use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// 是否在发布/取消发布时通知变更监听器
pub const KEY_NOTIFY_ENABLE: &str = "provider.notify.enable";

/// 开发环境名称，开发环境默认关闭变更通知
pub const ENV_DEV: &str = "dev";

const ENV_PREFIX: &str = "RPC_PROVIDER_";

/// 进程级配置来源
pub trait ConfigManager: Send + Sync {
    fn group(&self) -> String;

    fn local_ip(&self) -> String;

    fn weight(&self) -> u32;

    fn bool_value(&self, key: &str, default: bool) -> bool;

    fn env(&self) -> String;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub group: String,
    #[serde(default = "default_local_ip")]
    pub local_ip: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default = "default_env")]
    pub env: String,
    /// 布尔开关，供 `bool_value` 查询
    #[serde(default)]
    pub switches: HashMap<String, bool>,
}

fn default_local_ip() -> String {
    "127.0.0.1".to_string()
}

fn default_weight() -> u32 {
    1
}

fn default_env() -> String {
    "product".to_string()
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            group: String::new(),
            local_ip: default_local_ip(),
            weight: default_weight(),
            env: default_env(),
            switches: HashMap::new(),
        }
    }
}

impl ProviderSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(path)?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Self, ConfigError> {
        let settings: ProviderSettings = toml::from_str(config_str)?;
        Ok(settings)
    }

    /// 从环境变量读取配置（`RPC_PROVIDER_GROUP` 等），会先加载 `.env`
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        let settings = envy::prefixed(ENV_PREFIX).from_env::<ProviderSettings>()?;
        Ok(settings)
    }

    pub fn with_switch(mut self, key: impl Into<String>, value: bool) -> Self {
        self.switches.insert(key.into(), value);
        self
    }
}

impl ConfigManager for ProviderSettings {
    fn group(&self) -> String {
        self.group.clone()
    }

    fn local_ip(&self) -> String {
        self.local_ip.clone()
    }

    fn weight(&self) -> u32 {
        self.weight
    }

    fn bool_value(&self, key: &str, default: bool) -> bool {
        self.switches.get(key).copied().unwrap_or(default)
    }

    fn env(&self) -> String {
        self.env.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_toml() {
        let settings = ProviderSettings::from_toml(
            r#"
            group = "black"
            local_ip = "10.0.0.1"
            weight = 5
            env = "dev"

            [switches]
            "provider.notify.enable" = true
            "#,
        )
        .expect("Failed to parse settings");

        assert_eq!(settings.group(), "black");
        assert_eq!(settings.local_ip(), "10.0.0.1");
        assert_eq!(settings.weight(), 5);
        assert_eq!(settings.env(), "dev");
        assert!(settings.bool_value(KEY_NOTIFY_ENABLE, false));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ProviderSettings::from_toml("").unwrap();

        assert_eq!(settings.group(), "");
        assert_eq!(settings.local_ip(), "127.0.0.1");
        assert_eq!(settings.weight(), 1);
        assert_eq!(settings.env(), "product");
        assert!(settings.bool_value("missing.key", true));
        assert!(!settings.bool_value("missing.key", false));
    }

    #[test]
    fn test_invalid_toml() {
        let result = ProviderSettings::from_toml("weight = \"heavy\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }
}
