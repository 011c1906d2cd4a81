//! # 网页授权码流程处理器
//!
//! `/auth/web/{provider}` 与 `/auth/mobile/{provider}` 共用。

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::{failure, found};
use crate::auth::CallbackParams;
use crate::server::{AppState, RequestId};
use crate::session::{session_cookie, state_cookie, state_cookie_removal, state_from_cookies};

/// 回调查询参数
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// 发起登录：写入 `state` cookie 并 302 到 provider 授权页
pub async fn begin_login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    request_id: RequestId,
    jar: CookieJar,
) -> Response {
    let start = match state.orchestrator.begin_web_login(&provider, &request_id) {
        Ok(start) => start,
        Err(err) => return failure(err, &request_id, "begin_web_login"),
    };

    let cookie = state_cookie(start.state.state().to_string(), state.cookie_secure());
    (jar.add(cookie), found(start.authorization_url.as_str())).into_response()
}

/// provider 回调：签发会话 cookie 并跳回前端
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    request_id: RequestId,
    jar: CookieJar,
) -> Response {
    let expected_state = state_from_cookies(&jar);
    let params = CallbackParams {
        code: query.code,
        state: query.state,
    };

    match state
        .orchestrator
        .complete_web_login(&provider, params, expected_state.as_deref(), &request_id)
        .await
    {
        Ok(issued) => {
            let jar = jar
                .remove(state_cookie_removal())
                .add(session_cookie(issued.token, state.cookie_secure()));
            (jar, found(&state.config.session.frontend_url)).into_response()
        }
        Err(err) => failure(err, &request_id, "complete_web_login"),
    }
}
