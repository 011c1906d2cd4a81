use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::config::ProviderSettings;
use crate::error::{AuthError, AuthResult, BrokerError};

/// 受支持的身份提供商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Google,
    Line,
    Github,
    Twitter,
    Facebook,
}

impl ProviderId {
    pub const ALL: [Self; 5] = [
        Self::Google,
        Self::Line,
        Self::Github,
        Self::Twitter,
        Self::Facebook,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Line => "line",
            Self::Github => "github",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
        }
    }

    /// 按名称解析（忽略大小写）
    pub fn parse(name: &str) -> AuthResult<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| AuthError::ProviderNotFound(name.to_string()))
    }

    /// 未配置 scope 时使用的默认值
    #[must_use]
    pub fn default_scopes(self) -> Vec<String> {
        let scopes: &[&str] = match self {
            Self::Google => &["openid", "email", "profile"],
            Self::Line => &["profile", "openid", "email"],
            Self::Github => &["read:user", "user:email"],
            Self::Twitter => &["users.read", "tweet.read", "offline.access"],
            Self::Facebook => &["email", "public_profile"],
        };
        scopes.iter().map(|s| (*s).to_string()).collect()
    }

    /// scope 之间的分隔符，Facebook 使用逗号
    #[must_use]
    pub const fn scope_separator(self) -> &'static str {
        match self {
            Self::Facebook => ",",
            _ => " ",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 客户端凭据，启动后不可变
#[derive(Clone)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub scopes: Vec<String>,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("callback_url", &self.callback_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl ProviderCredentials {
    #[must_use]
    pub fn from_settings(id: ProviderId, settings: &ProviderSettings) -> Self {
        let scopes = settings
            .scopes
            .clone()
            .filter(|scopes| !scopes.is_empty())
            .unwrap_or_else(|| id.default_scopes());
        Self {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            callback_url: settings.callback_url.clone(),
            scopes,
        }
    }

    /// 按 provider 的分隔符拼接 scope
    #[must_use]
    pub fn scope_string(&self, id: ProviderId) -> String {
        self.scopes.join(id.scope_separator())
    }
}

/// 授权、令牌与用户信息端点
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub authorize_url: Url,
    pub token_url: Url,
    pub userinfo_url: Url,
}

impl ProviderEndpoints {
    /// 各 provider 的公开端点
    pub fn defaults(id: ProviderId) -> Result<Self, BrokerError> {
        let (authorize, token, userinfo) = match id {
            ProviderId::Google => (
                "https://accounts.google.com/o/oauth2/v2/auth",
                "https://oauth2.googleapis.com/token",
                "https://openidconnect.googleapis.com/v1/userinfo",
            ),
            ProviderId::Line => (
                "https://access.line.me/oauth2/v2.1/authorize",
                "https://api.line.me/oauth2/v2.1/token",
                "https://api.line.me/oauth2/v2.1/userinfo",
            ),
            ProviderId::Github => (
                "https://github.com/login/oauth/authorize",
                "https://github.com/login/oauth/access_token",
                "https://api.github.com/user",
            ),
            ProviderId::Twitter => (
                "https://twitter.com/i/oauth2/authorize",
                "https://api.twitter.com/2/oauth2/token",
                "https://api.twitter.com/2/users/me",
            ),
            ProviderId::Facebook => (
                "https://www.facebook.com/v19.0/dialog/oauth",
                "https://graph.facebook.com/v19.0/oauth/access_token",
                "https://graph.facebook.com/me",
            ),
        };
        Ok(Self {
            authorize_url: parse_endpoint(id, authorize)?,
            token_url: parse_endpoint(id, token)?,
            userinfo_url: parse_endpoint(id, userinfo)?,
        })
    }

    /// 默认端点叠加配置中的覆盖项
    pub fn resolve(id: ProviderId, settings: &ProviderSettings) -> Result<Self, BrokerError> {
        let mut endpoints = Self::defaults(id)?;
        if let Some(url) = &settings.authorize_url {
            endpoints.authorize_url = parse_endpoint(id, url)?;
        }
        if let Some(url) = &settings.token_url {
            endpoints.token_url = parse_endpoint(id, url)?;
        }
        if let Some(url) = &settings.userinfo_url {
            endpoints.userinfo_url = parse_endpoint(id, url)?;
        }
        Ok(endpoints)
    }
}

fn parse_endpoint(id: ProviderId, raw: &str) -> Result<Url, BrokerError> {
    Url::parse(raw)
        .map_err(|e| BrokerError::config_with_source(format!("{id} 端点地址无效: {raw}"), e))
}

/// 一次交换或刷新得到的 provider 令牌，从不持久化
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderTokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub expires_in: Option<i64>,
}

/// 归一化后的用户信息，缺失字段为 `null`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
}

impl UserProfile {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// 展示用名称：name，其次 username，最后 id
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("google", ProviderId::Google)]
    #[case("LINE", ProviderId::Line)]
    #[case(" GitHub ", ProviderId::Github)]
    #[case("twitter", ProviderId::Twitter)]
    #[case("facebook", ProviderId::Facebook)]
    fn parse_provider_names(#[case] input: &str, #[case] expected: ProviderId) {
        assert_eq!(ProviderId::parse(input).unwrap(), expected);
    }

    #[test]
    fn unknown_provider_is_not_found() {
        let err = ProviderId::parse("myspace").unwrap_err();
        assert!(matches!(err, AuthError::ProviderNotFound(name) if name == "myspace"));
    }

    #[test]
    fn provider_id_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProviderId::Github).unwrap(),
            "\"github\""
        );
        assert_eq!(ProviderId::Twitter.to_string(), "twitter");
    }

    #[test]
    fn credentials_fall_back_to_default_scopes() {
        let settings = ProviderSettings {
            client_id: "id".into(),
            client_secret: "s3cr3t".into(),
            callback_url: "http://localhost/cb".into(),
            scopes: Some(Vec::new()),
            ..ProviderSettings::default()
        };
        let credentials = ProviderCredentials::from_settings(ProviderId::Facebook, &settings);
        assert_eq!(
            credentials.scope_string(ProviderId::Facebook),
            "email,public_profile"
        );
        assert!(!format!("{credentials:?}").contains("s3cr3t"));
    }

    #[test]
    fn endpoint_overrides_apply() {
        let settings = ProviderSettings {
            token_url: Some("http://127.0.0.1:9999/token".into()),
            ..ProviderSettings::default()
        };
        let endpoints = ProviderEndpoints::resolve(ProviderId::Github, &settings).unwrap();
        assert_eq!(endpoints.token_url.as_str(), "http://127.0.0.1:9999/token");
        assert_eq!(endpoints.userinfo_url.as_str(), "https://api.github.com/user");

        let bad = ProviderSettings {
            userinfo_url: Some("not a url".into()),
            ..ProviderSettings::default()
        };
        assert!(ProviderEndpoints::resolve(ProviderId::Github, &bad).is_err());
    }

    #[test]
    fn display_name_prefers_name_then_username() {
        let mut profile = UserProfile::new("42");
        assert_eq!(profile.display_name(), "42");
        profile.username = Some("bob".into());
        assert_eq!(profile.display_name(), "bob");
        profile.name = Some("Bob".into());
        assert_eq!(profile.display_name(), "Bob");
    }
}
