//! # 路由处理器

pub mod mobile;
pub mod session;
pub mod system;
pub mod web;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::error::AuthError;

/// 记录详细原因后返回通用错误体
pub(crate) fn failure(err: AuthError, request_id: &str, operation: &str) -> Response {
    err.log(request_id, operation);
    err.into_response()
}

/// `302 Found` 跳转
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
