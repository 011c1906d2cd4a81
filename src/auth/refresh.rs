//! 刷新流程：Start → SessionDecoded → CapabilityChecked → Refreshed | PassThrough | Failed

use super::orchestrator::{AuthOrchestrator, IssuedSession};
use crate::error::{AuthError, AuthResult};
use crate::logging::{LogComponent, LogStage};
use crate::provider::expiry_after;
use crate::session::SessionRecord;
use crate::{ldebug, linfo, lwarn};

/// 刷新结果
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// 拿到新的访问令牌并重新签发了会话
    Refreshed {
        access_token: String,
        session: IssuedSession,
    },
    /// 无需或无法刷新，原样返回当前访问令牌
    PassThrough { access_token: Option<String> },
}

impl RefreshOutcome {
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        match self {
            Self::Refreshed { access_token, .. } => Some(access_token),
            Self::PassThrough { access_token } => access_token.as_deref(),
        }
    }
}

impl AuthOrchestrator {
    /// 解码会话令牌并按需刷新 provider 访问令牌
    pub async fn refresh_session(
        &self,
        token: Option<&str>,
        request_id: &str,
    ) -> AuthResult<RefreshOutcome> {
        let token = token.ok_or(AuthError::Unauthorized)?;
        let record = self.codec.decode(token)?;
        self.refresh_record(record, request_id).await
    }

    /// 对已解码的会话执行刷新
    pub async fn refresh_record(
        &self,
        record: SessionRecord,
        request_id: &str,
    ) -> AuthResult<RefreshOutcome> {
        let pass_through = |record: SessionRecord| RefreshOutcome::PassThrough {
            access_token: record.access_token,
        };

        let Some(refresh_token) = record.refresh_token.clone() else {
            return Ok(pass_through(record));
        };
        let Some(adapter) = self.registry.get(record.provider_name) else {
            return Ok(pass_through(record));
        };
        let Some(refresher) = adapter.refresher() else {
            ldebug!(
                request_id,
                LogStage::TokenRefresh,
                LogComponent::Orchestrator,
                "refresh_unsupported",
                "provider 不支持刷新，原样返回访问令牌",
                provider = %record.provider_name
            );
            return Ok(pass_through(record));
        };

        let tokens = refresher
            .refresh_access_token(&refresh_token)
            .await
            .map_err(|e| {
                lwarn!(
                    request_id,
                    LogStage::TokenRefresh,
                    LogComponent::Orchestrator,
                    "refresh_failed",
                    "provider 刷新访问令牌失败",
                    provider = %record.provider_name,
                    kind = e.kind(),
                    error = %e
                );
                AuthError::Refresh(e.to_string())
            })?;

        let refreshed = SessionRecord {
            exp: expiry_after(Self::now(), tokens.expires_in),
            access_token: Some(tokens.access_token.clone()),
            // provider 未轮换时沿用旧的 refresh token
            refresh_token: tokens.refresh_token.or(Some(refresh_token)),
            user: record.user,
            provider_name: record.provider_name,
        };
        let token = self.codec.encode(&refreshed)?;

        linfo!(
            request_id,
            LogStage::TokenRefresh,
            LogComponent::Orchestrator,
            "access_token_refreshed",
            "访问令牌已刷新",
            provider = %refreshed.provider_name,
            exp = refreshed.exp
        );

        Ok(RefreshOutcome::Refreshed {
            access_token: tokens.access_token,
            session: IssuedSession {
                token,
                record: refreshed,
            },
        })
    }
}
