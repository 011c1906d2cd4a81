use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::ProviderError;
use crate::provider::authorize::{AuthorizationState, build_authorize_url};
use crate::provider::http::{ProviderHttp, TokenCall};
use crate::provider::id_token::decode_unverified;
use crate::provider::traits::{ProviderAdapter, TokenRefresher};
use crate::provider::types::{
    ProviderCredentials, ProviderEndpoints, ProviderId, ProviderTokenSet, UserProfile,
};

#[derive(Debug)]
pub struct GoogleProvider {
    credentials: ProviderCredentials,
    endpoints: ProviderEndpoints,
    http: ProviderHttp,
}

/// OIDC userinfo 响应
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

impl GoogleProvider {
    #[must_use]
    pub const fn new(
        credentials: ProviderCredentials,
        endpoints: ProviderEndpoints,
        http: ProviderHttp,
    ) -> Self {
        Self {
            credentials,
            endpoints,
            http,
        }
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<UserProfile, ProviderError> {
        let request = self
            .http
            .client()
            .get(self.endpoints.userinfo_url.clone())
            .bearer_auth(access_token);
        let info: GoogleUserInfo = self.http.fetch_profile(ProviderId::Google, request).await?;
        Ok(UserProfile {
            id: info.sub,
            email: info.email,
            name: info.name,
            username: None,
        })
    }
}

#[async_trait]
impl ProviderAdapter for GoogleProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Google
    }

    fn authorization_url(&self, state: &AuthorizationState) -> Url {
        build_authorize_url(
            ProviderId::Google,
            &self.endpoints.authorize_url,
            &self.credentials,
            state,
            &[("access_type", "offline"), ("include_granted_scopes", "true")],
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        _state: &AuthorizationState,
    ) -> Result<(ProviderTokenSet, Option<UserProfile>), ProviderError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("redirect_uri", self.credentials.callback_url.as_str()),
        ];
        let request = self
            .http
            .client()
            .post(self.endpoints.token_url.clone())
            .form(&form);
        let tokens = self
            .http
            .send_token_request(ProviderId::Google, TokenCall::Exchange, request)
            .await?;

        // ID token 来自同一次 TLS 调用，身份声明直接取自其 payload
        let from_id_token = tokens
            .id_token
            .as_deref()
            .and_then(|id_token| decode_unverified(id_token).ok())
            .and_then(|claims| claims.into_profile());

        let profile = match from_id_token {
            Some(profile) => profile,
            None => self.fetch_userinfo(&tokens.access_token).await?,
        };
        Ok((tokens, Some(profile)))
    }

    fn refresher(&self) -> Option<&dyn TokenRefresher> {
        Some(self as &dyn TokenRefresher)
    }
}

#[async_trait]
impl TokenRefresher for GoogleProvider {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<ProviderTokenSet, ProviderError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        let request = self
            .http
            .client()
            .post(self.endpoints.token_url.clone())
            .form(&form);
        self.http
            .send_token_request(ProviderId::Google, TokenCall::Refresh, request)
            .await
    }
}
