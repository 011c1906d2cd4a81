//! Errors raised while talking to an upstream identity provider.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// 令牌端点返回非 2xx 或结构不合法
    #[error("Provider '{provider}' token exchange failed: {message}")]
    Exchange { provider: String, message: String },

    /// 用户信息端点调用失败
    #[error("Provider '{provider}' profile fetch failed: {message}")]
    Profile { provider: String, message: String },

    /// 超出请求时限
    #[error("Provider '{provider}' request timed out")]
    Timeout { provider: String },

    /// 刷新访问令牌被拒绝
    #[error("Provider '{provider}' refresh failed: {message}")]
    Refresh { provider: String, message: String },
}

impl ProviderError {
    pub fn exchange(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Exchange {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn profile(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Profile {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>) -> Self {
        Self::Timeout {
            provider: provider.into(),
        }
    }

    pub fn refresh(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Refresh {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// 错误类别，写入运维日志
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Exchange { .. } => "exchange",
            Self::Profile { .. } => "profile",
            Self::Timeout { .. } => "timeout",
            Self::Refresh { .. } => "refresh",
        }
    }

    /// 出错的 provider 名称
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::Exchange { provider, .. }
            | Self::Profile { provider, .. }
            | Self::Timeout { provider }
            | Self::Refresh { provider, .. } => provider,
        }
    }
}
