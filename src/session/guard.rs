//! # 会话守卫
//!
//! 从请求中取出会话令牌并校验，把解码后的 [`SessionRecord`] 注入请求扩展。

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::codec::SessionCodec;
use super::extract::resolve_session_token;
use super::record::SessionRecord;
use crate::error::{AuthError, AuthResult};
use crate::logging::{LogComponent, LogStage};
use crate::server::RequestId;
use crate::{ldebug, lwarn};

#[derive(Debug, Clone)]
pub struct SessionGuard {
    codec: Arc<SessionCodec>,
}

impl SessionGuard {
    #[must_use]
    pub const fn new(codec: Arc<SessionCodec>) -> Self {
        Self { codec }
    }

    #[must_use]
    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    /// 没有令牌时返回 `Unauthorized`，校验失败返回 `InvalidSession`
    pub fn authenticate(&self, headers: &HeaderMap) -> AuthResult<SessionRecord> {
        let token = resolve_session_token(headers).ok_or(AuthError::Unauthorized)?;
        self.codec.decode(&token)
    }

    /// 非阻塞的登录状态检查，从不返回错误
    #[must_use]
    pub fn check_status(&self, headers: &HeaderMap) -> bool {
        self.authenticate(headers).is_ok()
    }
}

/// 受保护路由的中间件：校验失败直接返回 401
pub async fn require_session(
    State(guard): State<Arc<SessionGuard>>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map_or_else(|| "unknown".to_string(), ToString::to_string);

    match guard.authenticate(request.headers()) {
        Ok(record) => {
            ldebug!(
                request_id,
                LogStage::SessionVerify,
                LogComponent::Guard,
                "session_accepted",
                "会话校验通过",
                provider = %record.provider_name,
                user_id = %record.user.id
            );
            request.extensions_mut().insert(record);
            next.run(request).await
        }
        Err(err) => {
            lwarn!(
                request_id,
                LogStage::SessionVerify,
                LogComponent::Guard,
                "session_rejected",
                &err.to_string(),
                path = %request.uri().path()
            );
            // 过期、伪造与缺失统一为 401 Unauthorized
            AuthError::Unauthorized.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderId, UserProfile};
    use axum::http::{HeaderValue, header::AUTHORIZATION, header::COOKIE};

    fn guard() -> SessionGuard {
        SessionGuard::new(Arc::new(SessionCodec::new(b"guard-test-secret-guard-test-secret")))
    }

    fn record(exp: i64) -> SessionRecord {
        SessionRecord {
            user: UserProfile::new("u1"),
            provider_name: ProviderId::Line,
            access_token: Some("at".into()),
            refresh_token: None,
            exp,
        }
    }

    #[test]
    fn authenticate_without_token_is_unauthorized() {
        let err = guard().authenticate(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[test]
    fn check_status_never_fails() {
        let guard = guard();
        let now = chrono::Utc::now().timestamp();

        let mut headers = HeaderMap::new();
        assert!(!guard.check_status(&headers));

        headers.insert(COOKIE, HeaderValue::from_static("jwt=not.a.token"));
        assert!(!guard.check_status(&headers));

        let expired = guard.codec().encode(&record(now - 5)).unwrap();
        headers.insert(COOKIE, HeaderValue::from_str(&format!("jwt={expired}")).unwrap());
        assert!(!guard.check_status(&headers));

        let valid = guard.codec().encode(&record(now + 60)).unwrap();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {valid}")).unwrap(),
        );
        assert!(guard.check_status(&headers));
    }
}
