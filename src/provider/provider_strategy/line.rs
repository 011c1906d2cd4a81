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

/// LINE Login v2.1，client id/secret 即 channel id/secret
#[derive(Debug)]
pub struct LineProvider {
    credentials: ProviderCredentials,
    endpoints: ProviderEndpoints,
    http: ProviderHttp,
}

#[derive(Debug, Deserialize)]
struct LineUserInfo {
    sub: String,
    name: Option<String>,
    email: Option<String>,
}

impl LineProvider {
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
}

#[async_trait]
impl ProviderAdapter for LineProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Line
    }

    fn authorization_url(&self, state: &AuthorizationState) -> Url {
        build_authorize_url(
            ProviderId::Line,
            &self.endpoints.authorize_url,
            &self.credentials,
            state,
            &[],
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
            ("redirect_uri", self.credentials.callback_url.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        let request = self
            .http
            .client()
            .post(self.endpoints.token_url.clone())
            .form(&form);
        let tokens = self
            .http
            .send_token_request(ProviderId::Line, TokenCall::Exchange, request)
            .await?;

        let from_id_token = tokens
            .id_token
            .as_deref()
            .and_then(|id_token| decode_unverified(id_token).ok())
            .and_then(|claims| claims.into_profile());

        let profile = if let Some(profile) = from_id_token {
            profile
        } else {
            // 未申请 openid scope 时没有 ID token
            let request = self
                .http
                .client()
                .get(self.endpoints.userinfo_url.clone())
                .bearer_auth(&tokens.access_token);
            let info: LineUserInfo = self.http.fetch_profile(ProviderId::Line, request).await?;
            UserProfile {
                id: info.sub,
                email: info.email,
                name: info.name,
                username: None,
            }
        };
        Ok((tokens, Some(profile)))
    }

    fn refresher(&self) -> Option<&dyn TokenRefresher> {
        Some(self as &dyn TokenRefresher)
    }
}

#[async_trait]
impl TokenRefresher for LineProvider {
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
            .send_token_request(ProviderId::Line, TokenCall::Refresh, request)
            .await
    }
}
