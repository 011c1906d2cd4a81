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

/// Facebook Graph API，令牌端点使用 GET + 查询参数
#[derive(Debug)]
pub struct FacebookProvider {
    credentials: ProviderCredentials,
    endpoints: ProviderEndpoints,
    http: ProviderHttp,
}

#[derive(Debug, Deserialize)]
struct FacebookUser {
    id: String,
    name: Option<String>,
    email: Option<String>,
}

impl FacebookProvider {
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
impl ProviderAdapter for FacebookProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Facebook
    }

    fn authorization_url(&self, state: &AuthorizationState) -> Url {
        build_authorize_url(
            ProviderId::Facebook,
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
        let query = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("redirect_uri", self.credentials.callback_url.as_str()),
            ("code", code),
        ];
        let request = self
            .http
            .client()
            .get(self.endpoints.token_url.clone())
            .query(&query);
        let tokens = self
            .http
            .send_token_request(ProviderId::Facebook, TokenCall::Exchange, request)
            .await?;

        let request = self
            .http
            .client()
            .get(self.endpoints.userinfo_url.clone())
            .query(&[
                ("fields", "id,name,email"),
                ("access_token", tokens.access_token.as_str()),
            ]);
        let user: FacebookUser = self
            .http
            .fetch_profile(ProviderId::Facebook, request)
            .await?;

        let profile = UserProfile {
            id: user.id,
            email: user.email,
            name: user.name,
            username: None,
        };
        Ok((tokens, Some(profile)))
    }
}
