//! # 认证流程编排
//!
//! 调用 registry、adapter 与 codec 驱动网页授权码、移动端 ID token 和刷新三个流程。
//! 本身不关心具体是哪个 provider。

use std::sync::Arc;

use super::id_token_verifier::IdTokenVerifier;
use crate::provider::ProviderRegistry;
use crate::session::{SessionCodec, SessionRecord};

/// 新签发的会话
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub record: SessionRecord,
}

/// 编排器的行为开关
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// 回调时是否要求 `state` 与 cookie 一致
    pub verify_state: bool,
    /// 移动端允许的 clientId，空表示不限制
    pub allowed_client_ids: Vec<String>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            verify_state: true,
            allowed_client_ids: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct AuthOrchestrator {
    pub(super) registry: Arc<ProviderRegistry>,
    pub(super) codec: Arc<SessionCodec>,
    pub(super) verifier: Arc<dyn IdTokenVerifier>,
    /// 派生 PKCE verifier 的密钥
    pub(super) state_secret: Vec<u8>,
    pub(super) options: OrchestratorOptions,
}

impl AuthOrchestrator {
    #[must_use]
    pub fn new(
        registry: Arc<ProviderRegistry>,
        codec: Arc<SessionCodec>,
        verifier: Arc<dyn IdTokenVerifier>,
        state_secret: impl Into<Vec<u8>>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            registry,
            codec,
            verifier,
            state_secret: state_secret.into(),
            options,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    #[must_use]
    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    pub(super) fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}
