use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::Deserialize;
use url::Url;

use crate::error::ProviderError;
use crate::provider::authorize::{AuthorizationState, build_authorize_url};
use crate::provider::http::{ProviderHttp, TokenCall};
use crate::provider::traits::{ProviderAdapter, TokenRefresher};
use crate::provider::types::{
    ProviderCredentials, ProviderEndpoints, ProviderId, ProviderTokenSet, UserProfile,
};

/// Twitter OAuth 2.0，授权码流程强制 PKCE
#[derive(Debug)]
pub struct TwitterProvider {
    credentials: ProviderCredentials,
    endpoints: ProviderEndpoints,
    http: ProviderHttp,
}

#[derive(Debug, Deserialize)]
struct TwitterUserResponse {
    data: TwitterUser,
}

#[derive(Debug, Deserialize)]
struct TwitterUser {
    id: String,
    name: Option<String>,
    username: Option<String>,
}

impl TwitterProvider {
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

    /// 机密客户端使用 HTTP Basic 认证，公共客户端只带 client_id
    fn token_request(&self, form: &[(&str, &str)]) -> RequestBuilder {
        let request = self
            .http
            .client()
            .post(self.endpoints.token_url.clone())
            .form(form);
        if self.credentials.client_secret.is_empty() {
            request
        } else {
            request.basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
        }
    }
}

#[async_trait]
impl ProviderAdapter for TwitterProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Twitter
    }

    fn authorization_url(&self, state: &AuthorizationState) -> Url {
        let challenge = state.pkce_challenge();
        build_authorize_url(
            ProviderId::Twitter,
            &self.endpoints.authorize_url,
            &self.credentials,
            state,
            &[
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
    }

    async fn exchange_code(
        &self,
        code: &str,
        state: &AuthorizationState,
    ) -> Result<(ProviderTokenSet, Option<UserProfile>), ProviderError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.credentials.callback_url.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("code_verifier", state.pkce_verifier()),
        ];
        let tokens = self
            .http
            .send_token_request(
                ProviderId::Twitter,
                TokenCall::Exchange,
                self.token_request(&form),
            )
            .await?;

        let request = self
            .http
            .client()
            .get(self.endpoints.userinfo_url.clone())
            .bearer_auth(&tokens.access_token);
        let user: TwitterUserResponse =
            self.http.fetch_profile(ProviderId::Twitter, request).await?;

        let profile = UserProfile {
            id: user.data.id,
            email: None,
            name: user.data.name,
            username: user.data.username,
        };
        Ok((tokens, Some(profile)))
    }

    fn refresher(&self) -> Option<&dyn TokenRefresher> {
        Some(self as &dyn TokenRefresher)
    }
}

#[async_trait]
impl TokenRefresher for TwitterProvider {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<ProviderTokenSet, ProviderError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.credentials.client_id.as_str()),
        ];
        self.http
            .send_token_request(
                ProviderId::Twitter,
                TokenCall::Refresh,
                self.token_request(&form),
            )
            .await
    }
}
