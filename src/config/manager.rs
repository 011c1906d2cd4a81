//! # 配置管理器
//!
//! 启动时读取一次 TOML 配置文件，再叠加环境变量覆盖并校验。不支持热重载。

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{AppConfig, ProviderSettings};
use crate::error::{BrokerError, Result};

/// 识别的环境变量及其对应的配置路径
const ENV_MAPPINGS: &[(&str, &str)] = &[
    ("JWT_SECRET", "session.jwt_secret"),
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("FE_DOMAIN", "session.frontend_url"),
    // 后出现者优先，FRONTEND_URL 覆盖 FE_DOMAIN
    ("FRONTEND_URL", "session.frontend_url"),
    ("GOOGLE_CLIENT_ID", "google.client_id"),
    ("GOOGLE_CLIENT_SECRET", "google.client_secret"),
    ("GOOGLE_CALLBACK_URL", "google.callback_url"),
    ("LINE_CHANNEL_ID", "line.client_id"),
    ("LINE_CHANNEL_SECRET", "line.client_secret"),
    ("LINE_CALLBACK_URL", "line.callback_url"),
    ("GITHUB_CLIENT_ID", "github.client_id"),
    ("GITHUB_CLIENT_SECRET", "github.client_secret"),
    ("GITHUB_CALLBACK_URL", "github.callback_url"),
    ("TWITTER_CLIENT_ID", "twitter.client_id"),
    ("TWITTER_CLIENT_SECRET", "twitter.client_secret"),
    ("TWITTER_CALLBACK_URL", "twitter.callback_url"),
    ("FACEBOOK_CLIENT_ID", "facebook.client_id"),
    ("FACEBOOK_CLIENT_SECRET", "facebook.client_secret"),
    ("FACEBOOK_CALLBACK_URL", "facebook.callback_url"),
];

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 当前配置
    config: AppConfig,
    /// 实际读取的配置文件
    source: Option<PathBuf>,
    /// 应用的环境变量覆盖数量
    override_count: usize,
}

impl ConfigManager {
    /// 按默认规则定位配置文件并加载
    ///
    /// `AUTH_BROKER_CONFIG_PATH` 优先；否则尝试 `config/config.{RUST_ENV}.toml`，
    /// 文件不存在时仅使用默认值和环境变量。
    pub fn new() -> Result<Self> {
        if let Ok(path) = env::var("AUTH_BROKER_CONFIG_PATH") {
            return Self::from_file(path);
        }

        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let candidate = PathBuf::from(format!("config/config.{env_name}.toml"));
        if candidate.exists() {
            Self::from_file(candidate)
        } else {
            debug!("未找到配置文件 {:?}，使用默认配置", candidate);
            Self::from_parts(AppConfig::default(), None, env::vars())
        }
    }

    /// 从指定文件创建配置管理器，文件必须存在
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with_env(config_path, env::vars())
    }

    /// 从指定文件和给定的环境变量集合创建配置管理器
    pub fn from_file_with_env<I>(config_path: impl AsRef<Path>, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config_path = config_path.as_ref();
        let config = Self::load_config_file(config_path)?;
        Self::from_parts(config, Some(config_path.to_path_buf()), vars)
    }

    /// 在给定配置上应用环境变量覆盖并校验
    pub fn from_parts<I>(mut config: AppConfig, source: Option<PathBuf>, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let overrides = Self::build_env_overrides(vars);
        Self::apply_env_overrides(&mut config, &overrides)?;

        config.validate().map_err(BrokerError::config)?;
        if config.has_weak_secret() {
            warn!("session.jwt_secret 少于 32 字节，建议使用更长的随机密钥");
        }

        info!("配置管理器初始化完成");
        info!("- 配置文件: {:?}", source);
        info!("- 环境变量覆盖: {} 个", overrides.len());

        Ok(Self {
            config,
            source,
            override_count: overrides.len(),
        })
    }

    /// 获取当前配置
    #[must_use]
    pub const fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// 取出配置
    #[must_use]
    pub fn into_config(self) -> AppConfig {
        self.config
    }

    /// 实际读取的配置文件
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    #[must_use]
    pub const fn override_count(&self) -> usize {
        self.override_count
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Err(crate::config_error!("配置文件不存在: {:?}", path));
        }

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            BrokerError::config_with_source(format!("读取配置文件失败: {path:?}"), e)
        })?;

        toml::from_str(&config_content).map_err(|e| {
            BrokerError::config_with_source(
                format!("TOML解析失败 - 配置文件: {path:?}, 详细错误: {e}"),
                e,
            )
        })
    }

    /// 构建环境变量覆盖映射（配置路径 -> 值）
    fn build_env_overrides<I>(vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .collect();

        let mut overrides = HashMap::new();
        for (name, path) in ENV_MAPPINGS {
            if let Some(value) = vars.get(*name) {
                overrides.insert((*path).to_string(), value.clone());
            }
        }

        debug!("发现 {} 个环境变量覆盖", overrides.len());
        overrides
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (path, value) in overrides {
            debug!(
                "应用环境变量覆盖: {} = {}",
                path,
                if path.contains("secret") {
                    "***"
                } else {
                    value
                }
            );

            Self::apply_override_to_config(config, path, value)?;
        }
        Ok(())
    }

    /// 将环境变量覆盖应用到配置对象
    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();

        match parts.as_slice() {
            ["server", "host"] => config.server.host = value.to_string(),
            ["server", "port"] => {
                config.server.port = value.parse().map_err(|e| {
                    BrokerError::config_with_source(format!("无效的端口号: {value}"), e)
                })?;
            }
            ["session", "jwt_secret"] => config.session.jwt_secret = value.to_string(),
            ["session", "frontend_url"] => config.session.frontend_url = value.to_string(),
            [provider, field] => {
                let slot = match *provider {
                    "google" => &mut config.providers.google,
                    "line" => &mut config.providers.line,
                    "github" => &mut config.providers.github,
                    "twitter" => &mut config.providers.twitter,
                    "facebook" => &mut config.providers.facebook,
                    _ => {
                        warn!("未知的配置路径，忽略环境变量覆盖: {}", path);
                        return Ok(());
                    }
                };
                let settings = slot.get_or_insert_with(ProviderSettings::default);
                match *field {
                    "client_id" => settings.client_id = value.to_string(),
                    "client_secret" => settings.client_secret = value.to_string(),
                    "callback_url" => settings.callback_url = value.to_string(),
                    _ => warn!("未知的配置路径，忽略环境变量覆盖: {}", path),
                }
            }
            _ => {
                warn!("未知的配置路径，忽略环境变量覆盖: {}", path);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides_populate_providers() {
        let manager = ConfigManager::from_parts(
            AppConfig::default(),
            None,
            vars(&[
                ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
                ("SERVER_PORT", "4000"),
                ("LINE_CHANNEL_ID", "line-channel"),
                ("LINE_CHANNEL_SECRET", "line-secret"),
                ("LINE_CALLBACK_URL", "http://localhost/auth/web/line/callback"),
                ("UNRELATED", "x"),
            ]),
        )
        .unwrap();

        let config = manager.get_config();
        assert_eq!(config.server.port, 4000);
        let line = config.providers.line.as_ref().unwrap();
        assert_eq!(line.client_id, "line-channel");
        assert_eq!(line.client_secret, "line-secret");
        assert!(config.providers.github.is_none());
        assert_eq!(manager.override_count(), 5);
    }

    #[test]
    fn test_frontend_url_beats_fe_domain() {
        let manager = ConfigManager::from_parts(
            AppConfig::default(),
            None,
            vars(&[
                ("JWT_SECRET", "secret"),
                ("FE_DOMAIN", "https://old.example.com"),
                ("FRONTEND_URL", "https://app.example.com"),
            ]),
        )
        .unwrap();
        assert_eq!(
            manager.get_config().session.frontend_url,
            "https://app.example.com"
        );
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let err = ConfigManager::from_parts(
            AppConfig::default(),
            None,
            vars(&[("JWT_SECRET", "secret"), ("SERVER_PORT", "not-a-port")]),
        )
        .unwrap_err();
        assert!(matches!(err, BrokerError::Config { .. }));
    }

    #[test]
    fn test_missing_secret_fails_validation() {
        let err = ConfigManager::from_parts(AppConfig::default(), None, Vec::new()).unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));
    }
}
