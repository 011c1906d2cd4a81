//! 会话令牌的签发与校验
//!
//! HS256，单一共享密钥，零容差。过期与伪造对客户端不可区分。

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::record::{SessionClaims, SessionRecord};
use crate::error::{AuthError, AuthResult};

/// 会话令牌编解码器
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec").finish_non_exhaustive()
    }
}

impl SessionCodec {
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// 签发令牌，`exp` 取自记录，`iat` 为当前时间
    pub fn encode(&self, record: &SessionRecord) -> AuthResult<String> {
        self.encode_at(record, chrono::Utc::now().timestamp())
    }

    pub(crate) fn encode_at(&self, record: &SessionRecord, iat: i64) -> AuthResult<String> {
        let claims = SessionClaims {
            record: record.clone(),
            iat,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::SessionEncoding(e.to_string()))
    }

    /// 一次性校验签名、结构与过期时间
    pub fn decode(&self, token: &str) -> AuthResult<SessionRecord> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidSession(format!("{:?}", e.kind())))?;

        let record = data.claims.record;
        // 库的过期判断在 exp == now 时仍放行
        if record.is_expired_at(chrono::Utc::now().timestamp()) {
            return Err(AuthError::InvalidSession("ExpiredSignature".to_string()));
        }
        Ok(record)
    }
}
