//! 网页授权码流程：Start → Redirected → CallbackReceived → Exchanged → Issued | Failed

use url::Url;

use super::orchestrator::{AuthOrchestrator, IssuedSession};
use crate::error::{AuthError, AuthResult, ProviderError};
use crate::logging::{LogComponent, LogStage, sanitize_token};
use crate::provider::{AuthorizationState, ProviderId};
use crate::session::SessionRecord;
use crate::{ldebug, linfo};

/// 发起登录的结果：跳转地址与本次的 `state`
#[derive(Debug, Clone)]
pub struct WebLoginStart {
    pub provider: ProviderId,
    pub authorization_url: Url,
    pub state: AuthorizationState,
}

/// 回调请求带回的参数
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

impl AuthOrchestrator {
    /// 查找 provider 并生成授权 URL
    pub fn begin_web_login(&self, provider: &str, request_id: &str) -> AuthResult<WebLoginStart> {
        let adapter = self.registry.resolve(provider)?;
        let state = AuthorizationState::generate(&self.state_secret);
        let authorization_url = adapter.authorization_url(&state);

        linfo!(
            request_id,
            LogStage::Authentication,
            LogComponent::Orchestrator,
            "begin_web_login",
            "生成授权跳转地址",
            provider = %adapter.provider_id()
        );

        Ok(WebLoginStart {
            provider: adapter.provider_id(),
            authorization_url,
            state,
        })
    }

    /// 处理回调：校验参数、交换令牌、签发会话
    ///
    /// `expected_state` 为 `state` cookie 中保存的值。
    pub async fn complete_web_login(
        &self,
        provider: &str,
        params: CallbackParams,
        expected_state: Option<&str>,
        request_id: &str,
    ) -> AuthResult<IssuedSession> {
        let code = params
            .code
            .filter(|code| !code.is_empty())
            .ok_or(AuthError::MissingCode)?;

        let adapter = self.registry.resolve(provider)?;
        let provider_id = adapter.provider_id();

        let returned_state = params.state.unwrap_or_default();
        let state = AuthorizationState::from_state(returned_state, &self.state_secret);
        if self.options.verify_state {
            let expected = expected_state.ok_or(AuthError::InvalidState)?;
            if state.state().is_empty() || !state.matches(expected) {
                return Err(AuthError::InvalidState);
            }
        }

        ldebug!(
            request_id,
            LogStage::TokenExchange,
            LogComponent::Orchestrator,
            "exchange_code",
            "使用授权码交换令牌",
            provider = %provider_id,
            code = %sanitize_token(&code)
        );

        let (tokens, profile) = adapter.exchange_code(&code, &state).await?;
        let user = profile
            .ok_or_else(|| ProviderError::profile(provider_id.as_str(), "no user profile"))?;

        let record = SessionRecord {
            user,
            provider_name: provider_id,
            exp: adapter.session_expiry(&tokens, Self::now()),
            access_token: Some(tokens.access_token),
            refresh_token: tokens.refresh_token,
        };
        let token = self.codec.encode(&record)?;

        linfo!(
            request_id,
            LogStage::SessionIssue,
            LogComponent::Orchestrator,
            "web_session_issued",
            "网页登录成功，已签发会话",
            provider = %provider_id,
            user_id = %record.user.id,
            exp = record.exp
        );

        Ok(IssuedSession { token, record })
    }
}
