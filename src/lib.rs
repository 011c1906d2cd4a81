//! # Auth Broker
//!
//! 多 provider 的 OAuth2 / OIDC 认证代理：完成授权码交换或 ID token 校验，
//! 把得到的用户身份签发为自包含的 HS256 会话令牌，并提供状态检查与访问令牌刷新。

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod server;
pub mod session;

// Re-export commonly used types
pub use config::{AppConfig, ConfigManager};
pub use error::{AuthError, BrokerError, Result};
pub use server::{AppState, AuthServer};
