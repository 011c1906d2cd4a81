use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::ProviderError;
use crate::provider::authorize::{AuthorizationState, build_authorize_url};
use crate::provider::http::{ProviderHttp, TokenCall};
use crate::provider::traits::ProviderAdapter;
use crate::provider::types::{
    ProviderCredentials, ProviderEndpoints, ProviderId, ProviderTokenSet, UserProfile,
};

/// GitHub 不提供刷新能力
#[derive(Debug)]
pub struct GithubProvider {
    credentials: ProviderCredentials,
    endpoints: ProviderEndpoints,
    http: ProviderHttp,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    #[serde(default)]
    id: serde_json::Value,
    login: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

impl GithubProvider {
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
impl ProviderAdapter for GithubProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Github
    }

    fn authorization_url(&self, state: &AuthorizationState) -> Url {
        build_authorize_url(
            ProviderId::Github,
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
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.credentials.callback_url.as_str()),
        ];
        let request = self
            .http
            .client()
            .post(self.endpoints.token_url.clone())
            .form(&form);
        let tokens = self
            .http
            .send_token_request(ProviderId::Github, TokenCall::Exchange, request)
            .await?;

        let request = self
            .http
            .client()
            .get(self.endpoints.userinfo_url.clone())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("token {}", tokens.access_token),
            );
        let user: GithubUser = self.http.fetch_profile(ProviderId::Github, request).await?;

        let id = match user.id {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) if !s.is_empty() => s,
            _ => return Err(ProviderError::profile("github", "user has no id")),
        };

        let profile = UserProfile {
            id,
            email: user.email,
            name: user.name,
            username: user.login,
        };
        Ok((tokens, Some(profile)))
    }
}
