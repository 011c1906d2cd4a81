use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ProviderSettings, ProvidersConfig};
use crate::error::{AuthError, AuthResult, Result};
use crate::linfo;
use crate::logging::{LogComponent, LogStage};

use super::http::ProviderHttp;
use super::provider_strategy::{
    FacebookProvider, GithubProvider, GoogleProvider, LineProvider, TwitterProvider,
};
use super::traits::ProviderAdapter;
use super::types::{ProviderCredentials, ProviderEndpoints, ProviderId};

/// 启动时构建的只读 provider 查找表
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
    adapters: HashMap<ProviderId, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 按配置注册所有凭据完整的 provider，共享同一个 HTTP 客户端
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let http = ProviderHttp::new(Duration::from_secs(config.request_timeout_secs))?;
        Self::with_http(config, &http)
    }

    /// 使用调用方提供的 HTTP 客户端注册
    pub fn with_http(config: &ProvidersConfig, http: &ProviderHttp) -> Result<Self> {
        let mut registry = Self::new();

        for id in ProviderId::ALL {
            let settings = match id {
                ProviderId::Google => config.google.as_ref(),
                ProviderId::Line => config.line.as_ref(),
                ProviderId::Github => config.github.as_ref(),
                ProviderId::Twitter => config.twitter.as_ref(),
                ProviderId::Facebook => config.facebook.as_ref(),
            };
            let Some(settings) = settings.filter(|s| s.is_configured()) else {
                continue;
            };
            registry.register(build_adapter(id, settings, http.clone())?);
        }

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Registry,
            "providers_registered",
            "provider 注册完成",
            providers = ?registry.registered()
        );
        Ok(registry)
    }

    /// 注册 adapter，同一 provider 后注册者覆盖前者
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.provider_id(), adapter);
    }

    #[must_use]
    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&id).cloned()
    }

    /// 查找已注册的 provider，未注册同样视为不存在
    pub fn lookup(&self, id: ProviderId) -> AuthResult<Arc<dyn ProviderAdapter>> {
        self.get(id)
            .ok_or_else(|| AuthError::ProviderNotFound(id.as_str().to_string()))
    }

    /// 按路径中的名称解析并查找
    pub fn resolve(&self, name: &str) -> AuthResult<Arc<dyn ProviderAdapter>> {
        self.lookup(ProviderId::parse(name)?)
    }

    #[must_use]
    pub fn registered(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.adapters.keys().copied().collect();
        ids.sort_by_key(|id| id.as_str());
        ids
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

fn build_adapter(
    id: ProviderId,
    settings: &ProviderSettings,
    http: ProviderHttp,
) -> Result<Arc<dyn ProviderAdapter>> {
    let credentials = ProviderCredentials::from_settings(id, settings);
    let endpoints = ProviderEndpoints::resolve(id, settings)?;

    let adapter: Arc<dyn ProviderAdapter> = match id {
        ProviderId::Google => Arc::new(GoogleProvider::new(credentials, endpoints, http)),
        ProviderId::Line => Arc::new(LineProvider::new(credentials, endpoints, http)),
        ProviderId::Github => Arc::new(GithubProvider::new(credentials, endpoints, http)),
        ProviderId::Twitter => Arc::new(TwitterProvider::new(credentials, endpoints, http)),
        ProviderId::Facebook => Arc::new(FacebookProvider::new(credentials, endpoints, http)),
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::AuthorizationState;
    use std::collections::HashMap as Map;

    fn settings(client_id: &str) -> ProviderSettings {
        ProviderSettings {
            client_id: client_id.into(),
            client_secret: "secret".into(),
            callback_url: "http://localhost:3001/auth/web/x/callback".into(),
            ..ProviderSettings::default()
        }
    }

    #[test]
    fn only_configured_providers_register() {
        let config = ProvidersConfig {
            github: Some(settings("gh")),
            google: Some(settings("g")),
            twitter: Some(ProviderSettings::default()),
            ..ProvidersConfig::default()
        };
        let registry = ProviderRegistry::from_config(&config).unwrap();

        assert_eq!(
            registry.registered(),
            vec![ProviderId::Github, ProviderId::Google]
        );
        assert!(registry.lookup(ProviderId::Github).is_ok());
        assert!(matches!(
            registry.lookup(ProviderId::Twitter),
            Err(AuthError::ProviderNotFound(_))
        ));
        assert!(matches!(
            registry.resolve("myspace"),
            Err(AuthError::ProviderNotFound(_))
        ));
    }

    #[test]
    fn refresh_capability_per_provider() {
        let config = ProvidersConfig {
            google: Some(settings("g")),
            line: Some(settings("l")),
            github: Some(settings("gh")),
            twitter: Some(settings("t")),
            facebook: Some(settings("f")),
            ..ProvidersConfig::default()
        };
        let registry = ProviderRegistry::from_config(&config).unwrap();

        let capable: Vec<bool> = ProviderId::ALL
            .into_iter()
            .map(|id| registry.lookup(id).unwrap().refresher().is_some())
            .collect();
        // google, line, github, twitter, facebook
        assert_eq!(capable, vec![true, true, false, true, false]);
    }

    #[test]
    fn authorization_urls_carry_provider_specifics() {
        let config = ProvidersConfig {
            google: Some(settings("g")),
            twitter: Some(settings("t")),
            ..ProvidersConfig::default()
        };
        let registry = ProviderRegistry::from_config(&config).unwrap();
        let state = AuthorizationState::from_state("st", b"secret");

        let google = registry.lookup(ProviderId::Google).unwrap();
        let params: Map<_, _> = google
            .authorization_url(&state)
            .query_pairs()
            .into_owned()
            .collect();
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["include_granted_scopes"], "true");
        assert_eq!(params["scope"], "openid email profile");

        let twitter = registry.lookup(ProviderId::Twitter).unwrap();
        let params: Map<_, _> = twitter
            .authorization_url(&state)
            .query_pairs()
            .into_owned()
            .collect();
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["code_challenge"], state.pkce_challenge());
        assert_eq!(params["state"], "st");
    }
}
