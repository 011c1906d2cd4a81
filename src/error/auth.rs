//! Errors produced by the authentication flows and the session gate.
//!
//! Client-facing bodies stay generic; the detailed cause only goes to the log.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use super::ProviderError;
use crate::logging::{LogComponent, LogStage};

/// The primary error type for all authentication and session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Authorization code not found")]
    MissingCode,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid authorization state")]
    InvalidState,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("ID token verification failed: {0}")]
    TokenVerificationFailed(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Invalid session token: {0}")]
    InvalidSession(String),

    #[error("No session present")]
    Unauthorized,

    #[error("Access token refresh failed: {0}")]
    Refresh(String),

    #[error("Failed to encode session token: {0}")]
    SessionEncoding(String),
}

/// A `Result` alias for the auth flows.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

impl AuthError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ProviderNotFound(_)
            | Self::MissingCode
            | Self::MissingField(_)
            | Self::InvalidState
            | Self::UnsupportedProvider(_) => StatusCode::BAD_REQUEST,
            Self::Provider(_) | Self::SessionEncoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::TokenVerificationFailed(_)
            | Self::InvalidSession(_)
            | Self::Unauthorized
            | Self::Refresh(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// 返回给客户端的通用错误信息
    #[must_use]
    pub const fn client_message(&self) -> &'static str {
        match self {
            Self::ProviderNotFound(_) => "Provider not found",
            Self::MissingCode => "Authorization code not found",
            Self::MissingField(_) => "providerName, token and clientId are required",
            Self::InvalidState => "Invalid authorization state",
            Self::UnsupportedProvider(_) => "Unsupported provider",
            Self::Provider(_) | Self::SessionEncoding(_) | Self::TokenVerificationFailed(_) => {
                "Authentication failed"
            }
            Self::InvalidSession(_) | Self::Unauthorized => "Unauthorized",
            Self::Refresh(_) => "Could not refresh access token",
        }
    }

    /// 记录面向运维的详细错误
    pub fn log(&self, request_id: &str, operation: &str) {
        let status = self.status_code().as_u16();
        if self.status_code().is_server_error() {
            crate::lerror!(
                request_id,
                LogStage::Error,
                LogComponent::Orchestrator,
                operation,
                &self.to_string(),
                status = status
            );
        } else {
            crate::lwarn!(
                request_id,
                LogStage::Error,
                LogComponent::Orchestrator,
                operation,
                &self.to_string(),
                status = status
            );
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(json!({ "error": self.client_message() })),
        )
            .into_response()
    }
}
