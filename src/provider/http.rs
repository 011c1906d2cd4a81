//! 所有 provider 共享的 HTTP 客户端与响应解析

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::types::{ProviderId, ProviderTokenSet};
use crate::error::{BrokerError, ProviderError};
use crate::ldebug;
use crate::logging::{LogComponent, LogStage};

/// 令牌端点的原始响应
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    // 错误响应字段
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenResponse {
    fn into_token_set(self) -> Result<ProviderTokenSet, String> {
        if let Some(error) = self.error {
            return Err(format!(
                "{}: {}",
                error,
                self.error_description.unwrap_or_default()
            ));
        }
        let access_token = self
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| "token response has no access_token".to_string())?;
        Ok(ProviderTokenSet {
            access_token,
            refresh_token: self.refresh_token.filter(|token| !token.is_empty()),
            id_token: self.id_token.filter(|token| !token.is_empty()),
            expires_in: self.expires_in,
        })
    }
}

/// 令牌请求的用途，决定失败时的错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCall {
    Exchange,
    Refresh,
}

impl TokenCall {
    fn error(self, provider: ProviderId, message: String) -> ProviderError {
        match self {
            Self::Exchange => ProviderError::exchange(provider.as_str(), message),
            Self::Refresh => ProviderError::refresh(provider.as_str(), message),
        }
    }
}

/// 带超时的共享 HTTP 客户端，内部连接池可被所有 adapter 复用
#[derive(Debug, Clone)]
pub struct ProviderHttp {
    client: Client,
}

impl ProviderHttp {
    pub fn new(timeout: Duration) -> Result<Self, BrokerError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("auth-broker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BrokerError::server_init_with_source("创建 HTTP 客户端失败", e))?;
        Ok(Self { client })
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// 发送令牌请求并解析为 [`ProviderTokenSet`]
    pub async fn send_token_request(
        &self,
        provider: ProviderId,
        call: TokenCall,
        request: RequestBuilder,
    ) -> Result<ProviderTokenSet, ProviderError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| send_error(provider, &e, |m| call.error(provider, m)))?;

        let status = response.status();
        let body = read_body(provider, response, |m| call.error(provider, m)).await?;

        if !status.is_success() {
            ldebug!(
                "system",
                LogStage::TokenExchange,
                LogComponent::Provider,
                "token_error_response",
                "令牌端点返回错误",
                provider = %provider,
                status = status.as_u16()
            );
            let detail = serde_json::from_str::<TokenResponse>(&body)
                .ok()
                .and_then(|r| r.error.map(|e| format!("{e}: {}", r.error_description.unwrap_or_default())))
                .unwrap_or(body);
            return Err(call.error(provider, format!("HTTP {status}: {detail}")));
        }

        let parsed = serde_json::from_str::<TokenResponse>(&body)
            .map_err(|e| call.error(provider, format!("invalid token response: {e}")))?;

        ldebug!(
            "system",
            LogStage::TokenExchange,
            LogComponent::Provider,
            "token_response",
            "令牌端点响应已解析",
            provider = %provider,
            token_type = ?parsed.token_type,
            expires_in = ?parsed.expires_in,
            has_refresh_token = parsed.refresh_token.is_some(),
            has_id_token = parsed.id_token.is_some(),
            scope = ?parsed.scope
        );

        parsed
            .into_token_set()
            .map_err(|message| call.error(provider, message))
    }

    /// 调用用户信息端点并反序列化
    pub async fn fetch_profile<T: DeserializeOwned>(
        &self,
        provider: ProviderId,
        request: RequestBuilder,
    ) -> Result<T, ProviderError> {
        let profile_error = |m: String| ProviderError::profile(provider.as_str(), m);

        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| send_error(provider, &e, profile_error))?;

        let status = response.status();
        let body = read_body(provider, response, profile_error).await?;
        if !status.is_success() {
            return Err(profile_error(format!("HTTP {status}: {body}")));
        }

        serde_json::from_str(&body).map_err(|e| profile_error(format!("invalid profile: {e}")))
    }
}

fn send_error(
    provider: ProviderId,
    err: &reqwest::Error,
    otherwise: impl FnOnce(String) -> ProviderError,
) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(provider.as_str())
    } else {
        otherwise(err.to_string())
    }
}

async fn read_body(
    provider: ProviderId,
    response: Response,
    otherwise: impl FnOnce(String) -> ProviderError,
) -> Result<String, ProviderError> {
    response
        .text()
        .await
        .map_err(|e| send_error(provider, &e, otherwise))
}
