//! # 应用配置结构定义

use serde::{Deserialize, Serialize};

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 会话令牌配置
    #[serde(default)]
    pub session: SessionConfig,
    /// 第三方身份提供商配置
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// 移动端 ID token 校验配置
    #[serde(default)]
    pub mobile: MobileConfig,
}

/// HTTP 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 允许的跨域来源，空表示不启用 CORS，`*` 表示任意来源
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// 监听地址，例如 `127.0.0.1:3001`
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 会话令牌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// HS256 签名密钥，必须配置
    pub jwt_secret: String,
    /// 会话 cookie 是否附带 `Secure`
    pub cookie_secure: bool,
    /// 回调时是否校验 `state`
    pub verify_state: bool,
    /// 网页登录成功后跳转的前端地址
    pub frontend_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            cookie_secure: false,
            verify_state: true,
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

/// 所有 provider 的配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// 调用 provider 的请求超时（秒）
    pub request_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google: Option<ProviderSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<ProviderSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<ProviderSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<ProviderSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<ProviderSettings>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            google: None,
            line: None,
            github: None,
            twitter: None,
            facebook: None,
        }
    }
}

/// 单个 provider 的凭据与端点覆盖
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    /// 为空时使用 provider 的默认 scope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorize_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_url: Option<String>,
}

impl ProviderSettings {
    /// 凭据是否完整（未完整配置的 provider 不会注册）
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.callback_url.is_empty()
    }
}

/// 移动端 ID token 校验配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MobileConfig {
    /// Google 公钥集合地址
    pub jwks_url: String,
    /// JWKS 缓存时间（秒）
    pub jwks_cache_ttl_secs: u64,
    /// 允许的 clientId，空表示不限制
    pub allowed_client_ids: Vec<String>,
}

impl Default for MobileConfig {
    fn default() -> Self {
        Self {
            jwks_url: "https://www.googleapis.com/oauth2/v3/certs".to_string(),
            jwks_cache_ttl_secs: 3600,
            allowed_client_ids: Vec::new(),
        }
    }
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be greater than 0".to_string());
        }
        if self.session.jwt_secret.is_empty() {
            return Err("session.jwt_secret must be set (or JWT_SECRET)".to_string());
        }
        if self.providers.request_timeout_secs == 0 {
            return Err("providers.request_timeout_secs must be greater than 0".to_string());
        }
        if url::Url::parse(&self.session.frontend_url).is_err() {
            return Err(format!(
                "session.frontend_url is not a valid URL: {}",
                self.session.frontend_url
            ));
        }
        if url::Url::parse(&self.mobile.jwks_url).is_err() {
            return Err(format!(
                "mobile.jwks_url is not a valid URL: {}",
                self.mobile.jwks_url
            ));
        }
        Ok(())
    }

    /// 签名密钥是否偏短
    #[must_use]
    pub fn has_weak_secret(&self) -> bool {
        self.session.jwt_secret.len() < 32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_address(), "127.0.0.1:3001");
        assert_eq!(config.providers.request_timeout_secs, 10);
        assert_eq!(config.mobile.jwks_cache_ttl_secs, 3600);
        assert!(config.session.verify_state);
    }

    #[test]
    fn test_validate_requires_secret() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_err());

        config.session.jwt_secret = "s".repeat(40);
        assert!(config.validate().is_ok());
        assert!(!config.has_weak_secret());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [session]
            jwt_secret = "abc"

            [providers.github]
            client_id = "gh"
            client_secret = "secret"
            callback_url = "http://localhost:3001/auth/web/github/callback"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 3001);
        assert!(config.has_weak_secret());
        let github = config.providers.github.unwrap();
        assert!(github.is_configured());
        assert!(github.scopes.is_none());
        assert!(config.providers.google.is_none());
    }
}
