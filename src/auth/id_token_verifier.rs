//! # 客户端提交的 ID token 校验
//!
//! 签名、签发者、受众与过期时间全部校验；公钥取自 provider 的 JWKS，
//! 并在 `moka` 缓存中保留一段时间。

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use moka::future::Cache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::error::{AuthError, AuthResult};
use crate::provider::UserProfile;

/// Google ID token 的合法签发者
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

const JWKS_CACHE_KEY: &str = "jwks";

/// 未知 `kid` 触发强制重新拉取 JWKS 的最小间隔
pub const JWKS_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

/// 校验通过的身份声明
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifiedIdToken {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
}

impl VerifiedIdToken {
    #[must_use]
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.sub.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            username: None,
        }
    }
}

#[async_trait]
pub trait IdTokenVerifier: Send + Sync + std::fmt::Debug {
    /// 校验 `id_token`，`audience` 为期望的 client id
    async fn verify(&self, id_token: &str, audience: &str) -> AuthResult<VerifiedIdToken>;
}

/// 基于 Google JWKS 的校验器
#[derive(Clone)]
pub struct GoogleIdTokenVerifier {
    http: reqwest::Client,
    jwks_url: Url,
    cache: Cache<&'static str, Arc<JwkSet>>,
    /// 存在即表示最近已强制刷新过，条目随间隔过期
    refetch_gate: Cache<&'static str, ()>,
}

impl std::fmt::Debug for GoogleIdTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleIdTokenVerifier")
            .field("jwks_url", &self.jwks_url.as_str())
            .finish_non_exhaustive()
    }
}

impl GoogleIdTokenVerifier {
    #[must_use]
    pub fn new(http: reqwest::Client, jwks_url: Url, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(cache_ttl)
            .build();
        let refetch_gate = Cache::builder()
            .max_capacity(1)
            .time_to_live(JWKS_REFETCH_INTERVAL)
            .build();
        Self {
            http,
            jwks_url,
            cache,
            refetch_gate,
        }
    }

    async fn fetch_jwks(&self) -> Result<Arc<JwkSet>, reqwest::Error> {
        let jwks = self
            .http
            .get(self.jwks_url.clone())
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;
        Ok(Arc::new(jwks))
    }

    async fn jwks(&self) -> AuthResult<Arc<JwkSet>> {
        self.cache
            .try_get_with(JWKS_CACHE_KEY, self.fetch_jwks())
            .await
            .map_err(|e| AuthError::TokenVerificationFailed(format!("JWKS fetch failed: {e}")))
    }

    /// 是否允许本次强制刷新；同一间隔内只放行第一个调用者
    async fn acquire_refetch(&self) -> bool {
        self.refetch_gate
            .entry(JWKS_CACHE_KEY)
            .or_insert(())
            .await
            .is_fresh()
    }

    /// 按 `kid` 查找公钥；缓存中没有时重新拉取以应对密钥轮换
    ///
    /// `kid` 由客户端决定，强制刷新受 [`JWKS_REFETCH_INTERVAL`] 限制。
    async fn decoding_key(&self, kid: &str) -> AuthResult<DecodingKey> {
        let mut jwks = self.jwks().await?;
        if jwks.find(kid).is_none() && self.acquire_refetch().await {
            self.cache.invalidate(JWKS_CACHE_KEY).await;
            jwks = self.jwks().await?;
        }
        let jwk = jwks
            .find(kid)
            .ok_or_else(|| AuthError::TokenVerificationFailed(format!("unknown key id: {kid}")))?;
        DecodingKey::from_jwk(jwk)
            .map_err(|e| AuthError::TokenVerificationFailed(format!("unusable JWK: {e}")))
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, id_token: &str, audience: &str) -> AuthResult<VerifiedIdToken> {
        let header = decode_header(id_token)
            .map_err(|e| AuthError::TokenVerificationFailed(format!("malformed token: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::TokenVerificationFailed(format!(
                "unexpected algorithm: {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::TokenVerificationFailed("token has no kid".to_string()))?;

        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = 30;

        decode::<VerifiedIdToken>(id_token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::TokenVerificationFailed(format!("{:?}", e.kind())))
    }
}
