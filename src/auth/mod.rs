//! # 认证模块
//!
//! - `orchestrator`：流程编排器与签发结果
//! - `web`：网页授权码流程
//! - `mobile`：移动端 ID token 流程
//! - `refresh`：访问令牌刷新
//! - `id_token_verifier`：基于 JWKS 的 ID token 校验

mod id_token_verifier;
mod mobile;
mod orchestrator;
mod refresh;
mod web;

pub use id_token_verifier::{
    GOOGLE_ISSUERS, GoogleIdTokenVerifier, IdTokenVerifier, VerifiedIdToken,
};
pub use mobile::MobileLoginRequest;
pub use orchestrator::{AuthOrchestrator, IssuedSession, OrchestratorOptions};
pub use refresh::RefreshOutcome;
pub use web::{CallbackParams, WebLoginStart};
