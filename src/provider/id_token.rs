//! # ID token 声明解析（不校验签名）
//!
//! 只用于服务端刚从 provider 令牌端点直接取得的 ID token；
//! 客户端提交的 ID token 必须走 [`crate::auth::IdTokenVerifier`]。

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::types::UserProfile;

/// ID token 中关心的 OIDC 声明
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iss: Option<String>,
    /// 其他声明
    #[serde(flatten)]
    pub other: HashMap<String, serde_json::Value>,
}

impl IdTokenClaims {
    /// 由 `sub`/`email`/`name` 构建用户信息，缺少 `sub` 时返回 `None`
    #[must_use]
    pub fn into_profile(self) -> Option<UserProfile> {
        let id = self.sub.filter(|sub| !sub.is_empty())?;
        Some(UserProfile {
            id,
            email: self.email,
            name: self.name,
            username: None,
        })
    }
}

/// ID token payload 解析失败
#[derive(Debug, Error)]
pub enum IdTokenDecodeError {
    #[error("ID token 不是三段式 JWS")]
    Malformed,
    #[error("payload base64url 解码失败: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload 不是合法的声明 JSON: {0}")]
    Claims(#[from] serde_json::Error),
}

/// 解码 payload 而不验证签名、过期时间与受众
///
/// 不依赖头部的 `alg`，RS256/ES256/HS256 签发的令牌都能读取。
pub fn decode_unverified(id_token: &str) -> Result<IdTokenClaims, IdTokenDecodeError> {
    let mut segments = id_token.split('.');
    let (Some(header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(IdTokenDecodeError::Malformed);
    };
    if header.is_empty() || payload.is_empty() {
        return Err(IdTokenDecodeError::Malformed);
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}
