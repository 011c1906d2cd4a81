//! # 会话相关处理器：状态、刷新与受保护示例

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use super::failure;
use crate::auth::RefreshOutcome;
use crate::server::{AppState, RequestId};
use crate::session::{SessionRecord, resolve_session_token, session_cookie};

/// `GET /auth/status`
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.guard.check_status(&headers) {
        (StatusCode::OK, Json(json!({ "authenticated": true }))).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false })),
        )
            .into_response()
    }
}

/// `POST|GET /auth/refresh`
///
/// 刷新成功时同时重新下发会话 cookie。
pub async fn refresh(
    State(state): State<AppState>,
    request_id: RequestId,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let token = resolve_session_token(&headers);
    match state
        .orchestrator
        .refresh_session(token.as_deref(), &request_id)
        .await
    {
        Ok(RefreshOutcome::Refreshed {
            access_token,
            session,
        }) => {
            let jar = jar.add(session_cookie(session.token, state.cookie_secure()));
            (jar, Json(json!({ "accessToken": access_token }))).into_response()
        }
        Ok(RefreshOutcome::PassThrough { access_token }) => {
            Json(json!({ "accessToken": access_token })).into_response()
        }
        Err(err) => failure(err, &request_id, "refresh_session"),
    }
}

/// `GET /api/data`，由会话守卫保护
pub async fn protected_data(Extension(record): Extension<SessionRecord>) -> Json<serde_json::Value> {
    Json(json!({
        "message": format!("Protected Data for user: {}", record.user.display_name()),
    }))
}
