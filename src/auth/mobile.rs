//! 移动端 ID token 流程：Start → Verified → Issued | Failed

use serde::Deserialize;

use super::orchestrator::{AuthOrchestrator, IssuedSession};
use crate::error::{AuthError, AuthResult};
use crate::linfo;
use crate::logging::{LogComponent, LogStage};
use crate::provider::ProviderId;
use crate::session::SessionRecord;

/// `POST /auth/mobile` 请求体
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileLoginRequest {
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> AuthResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(AuthError::MissingField(field))
}

impl AuthOrchestrator {
    /// 校验客户端提交的 ID token 并签发会话，目前只支持 Google
    pub async fn mobile_login(
        &self,
        request: MobileLoginRequest,
        request_id: &str,
    ) -> AuthResult<IssuedSession> {
        let provider_name = required(request.provider_name, "providerName")?;
        let id_token = required(request.token, "token")?;
        let client_id = required(request.client_id, "clientId")?;

        if ProviderId::parse(&provider_name).ok() != Some(ProviderId::Google) {
            return Err(AuthError::UnsupportedProvider(provider_name));
        }

        if !self.options.allowed_client_ids.is_empty()
            && !self.options.allowed_client_ids.contains(&client_id)
        {
            return Err(AuthError::TokenVerificationFailed(format!(
                "client id not allowed: {client_id}"
            )));
        }

        let verified = self.verifier.verify(&id_token, &client_id).await?;

        let record = SessionRecord {
            user: verified.to_profile(),
            provider_name: ProviderId::Google,
            access_token: None,
            refresh_token: None,
            exp: verified.exp,
        };
        let token = self.codec.encode(&record)?;

        linfo!(
            request_id,
            LogStage::SessionIssue,
            LogComponent::Mobile,
            "mobile_session_issued",
            "移动端 ID token 校验通过，已签发会话",
            user_id = %record.user.id,
            exp = record.exp
        );

        Ok(IssuedSession { token, record })
    }
}
