//! # 路由配置

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;

use super::AppState;
use super::handlers::{mobile, session, system, web};
use crate::session::require_session;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/data", get(session::protected_data))
        .route_layer(from_fn_with_state(state.guard.clone(), require_session));

    Router::new()
        .nest("/auth", auth_routes())
        .nest("/api", protected)
        .route("/ping", get(system::ping_handler))
        .with_state(state)
}

/// 认证路由
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/web/{provider}", get(web::begin_login))
        .route("/web/{provider}/callback", get(web::callback))
        .route("/mobile", axum::routing::post(mobile::mobile_login))
        .route("/mobile/{provider}", get(web::begin_login))
        .route("/mobile/{provider}/callback", get(web::callback))
        .route("/status", get(session::status))
        .route("/refresh", get(session::refresh).post(session::refresh))
}
