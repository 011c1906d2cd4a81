//! 授权请求的 `state` 与 PKCE 参数，以及授权 URL 构建

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use oauth2::{CsrfToken, PkceCodeChallenge, PkceCodeVerifier};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use url::Url;

use super::types::{ProviderCredentials, ProviderId};

/// 一次授权往返的 CSRF `state` 及由其派生的 PKCE verifier
///
/// verifier = base64url(sha256(secret ":" state))，回调时可由 `state` 重新计算，
/// 无需服务端存储。
#[derive(Clone)]
pub struct AuthorizationState {
    state: String,
    pkce_verifier: String,
}

impl std::fmt::Debug for AuthorizationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationState")
            .field("state", &self.state)
            .field("pkce_verifier", &"***")
            .finish()
    }
}

impl AuthorizationState {
    /// 生成新的随机 `state`
    #[must_use]
    pub fn generate(secret: &[u8]) -> Self {
        let csrf = CsrfToken::new_random();
        Self::from_state(csrf.secret().clone(), secret)
    }

    /// 由回调带回的 `state` 还原
    #[must_use]
    pub fn from_state(state: impl Into<String>, secret: &[u8]) -> Self {
        let state = state.into();
        let mut hasher = Sha256::new();
        hasher.update(secret);
        hasher.update(b":");
        hasher.update(state.as_bytes());
        let pkce_verifier = URL_SAFE_NO_PAD.encode(hasher.finalize());
        Self {
            state,
            pkce_verifier,
        }
    }

    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    #[must_use]
    pub fn pkce_verifier(&self) -> &str {
        &self.pkce_verifier
    }

    /// S256 code challenge
    #[must_use]
    pub fn pkce_challenge(&self) -> String {
        let verifier = PkceCodeVerifier::new(self.pkce_verifier.clone());
        PkceCodeChallenge::from_code_verifier_sha256(&verifier)
            .as_str()
            .to_string()
    }

    /// 常量时间比较回调中的 `state`
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.state.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

/// 构建标准授权 URL，`extra` 中的参数追加在通用参数之后
#[must_use]
pub fn build_authorize_url(
    provider: ProviderId,
    endpoint: &Url,
    credentials: &ProviderCredentials,
    state: &AuthorizationState,
    extra: &[(&str, &str)],
) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("response_type", "code")
            .append_pair("client_id", &credentials.client_id)
            .append_pair("redirect_uri", &credentials.callback_url)
            .append_pair("scope", &credentials.scope_string(provider))
            .append_pair("state", state.state());
        for (key, value) in extra {
            query.append_pair(key, value);
        }
    }
    url
}
