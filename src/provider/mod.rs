//! Provider capability module。
//!
//! - `types`：Provider 标识、凭据、端点、令牌与用户信息
//! - `traits`：`ProviderAdapter` 与可选的 `TokenRefresher` 能力
//! - `authorize`：`state` / PKCE 参数与授权 URL 构建
//! - `http`：共享 HTTP 客户端与令牌响应解析
//! - `id_token`：不校验签名的 ID token 声明解析
//! - `registry`：启动时构建的 provider 查找表

mod authorize;
mod http;
pub mod id_token;
mod provider_strategy;
mod registry;
mod traits;
mod types;

pub use authorize::{AuthorizationState, build_authorize_url};
pub use http::{ProviderHttp, TokenCall, TokenResponse};
pub use provider_strategy::{
    FacebookProvider, GithubProvider, GoogleProvider, LineProvider, TwitterProvider,
};
pub use registry::ProviderRegistry;
pub use traits::{
    DEFAULT_EXPIRES_IN, MAX_EXPIRES_IN, ProviderAdapter, TokenRefresher, expiry_after,
};
pub use types::{ProviderCredentials, ProviderEndpoints, ProviderId, ProviderTokenSet, UserProfile};
