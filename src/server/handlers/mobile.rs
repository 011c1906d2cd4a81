//! # 移动端登录处理器

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::failure;
use crate::auth::MobileLoginRequest;
use crate::server::{AppState, RequestId};

/// `POST /auth/mobile`
///
/// 请求体无法解析时按缺少字段处理。
pub async fn mobile_login(
    State(state): State<AppState>,
    request_id: RequestId,
    body: Result<Json<MobileLoginRequest>, JsonRejection>,
) -> Response {
    let request = body.map(|Json(request)| request).unwrap_or_default();

    match state.orchestrator.mobile_login(request, &request_id).await {
        Ok(issued) => Json(json!({
            "message": "Authentication successful",
            "token": issued.token,
            "user": issued.record.user,
        }))
        .into_response(),
        Err(err) => failure(err, &request_id, "mobile_login"),
    }
}
