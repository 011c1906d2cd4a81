//! # HTTP 服务器
//!
//! axum 路由、处理器与中间件。

mod app;
pub mod handlers;
pub mod middleware;
mod routes;

pub use app::{AppState, AuthServer};
pub use middleware::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use routes::create_routes;
