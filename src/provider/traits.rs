use async_trait::async_trait;
use url::Url;

use super::authorize::AuthorizationState;
use super::id_token::decode_unverified;
use super::types::{ProviderId, ProviderTokenSet, UserProfile};
use crate::error::ProviderError;

/// 未返回 `expires_in` 时的默认有效期（秒）
pub const DEFAULT_EXPIRES_IN: i64 = 3600;

/// `expires_in` 的上限（秒），与 Facebook 长期令牌的 60 天一致
pub const MAX_EXPIRES_IN: i64 = 60 * 24 * 3600;

/// 由 provider 返回的 `expires_in` 计算过期时间
///
/// 缺失或非正数按 [`DEFAULT_EXPIRES_IN`] 处理，过大值截断到 [`MAX_EXPIRES_IN`]。
#[must_use]
pub fn expiry_after(now: i64, expires_in: Option<i64>) -> i64 {
    let lifetime = match expires_in {
        Some(secs) if secs > 0 => secs.min(MAX_EXPIRES_IN),
        _ => DEFAULT_EXPIRES_IN,
    };
    now.saturating_add(lifetime)
}

/// 每个身份提供商的协议适配器
#[async_trait]
pub trait ProviderAdapter: Send + Sync + std::fmt::Debug {
    fn provider_id(&self) -> ProviderId;

    /// 构建授权 URL，纯函数无 I/O
    fn authorization_url(&self, state: &AuthorizationState) -> Url;

    /// 用授权码交换令牌；令牌响应中不含身份信息时再请求一次用户信息
    async fn exchange_code(
        &self,
        code: &str,
        state: &AuthorizationState,
    ) -> Result<(ProviderTokenSet, Option<UserProfile>), ProviderError>;

    /// 可选的刷新能力，不支持时返回 `None`
    fn refresher(&self) -> Option<&dyn TokenRefresher> {
        None
    }

    /// 读取 provider 签发的 ID token 中的 `exp`，不校验签名
    fn decode_id_token_expiry(&self, id_token: &str) -> Option<i64> {
        decode_unverified(id_token).ok().and_then(|claims| claims.exp)
    }

    /// 会话过期时间：优先 ID token 的 `exp`，否则 `now + expires_in`
    fn session_expiry(&self, tokens: &ProviderTokenSet, now: i64) -> i64 {
        tokens
            .id_token
            .as_deref()
            .and_then(|id_token| self.decode_id_token_expiry(id_token))
            .unwrap_or_else(|| expiry_after(now, tokens.expires_in))
    }
}

/// 使用 refresh token 换取新的访问令牌
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<ProviderTokenSet, ProviderError>;
}
