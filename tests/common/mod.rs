//! 集成测试共用的配置、令牌与请求工具

#![allow(dead_code)]

use auth_broker::config::{AppConfig, ProviderSettings};
use auth_broker::session::{SessionCodec, SessionRecord};
use auth_broker::{AppState, AuthServer};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const FRONTEND: &str = "http://localhost:3000/";
pub const MOBILE_CLIENT_ID: &str = "CID";
pub const FIXTURE_KID: &str = "test-key-1";

const FIXTURE_KEY: &[u8] = include_bytes!("../fixtures/id_token_rsa.pem");
pub const FIXTURE_JWKS: &str = include_str!("../fixtures/jwks.json");

/// 端点全部指向 mock 服务器的 provider 配置
pub fn provider_settings(server_uri: &str, name: &str) -> ProviderSettings {
    ProviderSettings {
        client_id: format!("{name}-client"),
        client_secret: format!("{name}-secret"),
        callback_url: format!("http://localhost:3001/auth/web/{name}/callback"),
        scopes: None,
        authorize_url: Some(format!("{server_uri}/{name}/authorize")),
        token_url: Some(format!("{server_uri}/{name}/token")),
        userinfo_url: Some(format!("{server_uri}/{name}/user")),
    }
}

/// 五个 provider 都已配置、JWKS 指向 mock 服务器
pub fn test_config(server_uri: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.session.jwt_secret = SECRET.to_string();
    config.session.frontend_url = FRONTEND.to_string();
    config.providers.request_timeout_secs = 2;
    config.providers.google = Some(provider_settings(server_uri, "google"));
    config.providers.line = Some(provider_settings(server_uri, "line"));
    config.providers.github = Some(provider_settings(server_uri, "github"));
    config.providers.twitter = Some(provider_settings(server_uri, "twitter"));
    config.providers.facebook = Some(provider_settings(server_uri, "facebook"));
    config.mobile.jwks_url = format!("{server_uri}/certs");
    config
}

pub fn app_state(config: AppConfig) -> AppState {
    AppState::from_config(config).expect("state builds from test config")
}

pub fn router(config: AppConfig) -> Router {
    AuthServer::new(app_state(config)).into_router()
}

pub fn codec() -> SessionCodec {
    SessionCodec::new(SECRET.as_bytes())
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// 用测试私钥签发 RS256 ID token
pub fn sign_id_token(claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(FIXTURE_KEY).expect("fixture key parses");
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(FIXTURE_KID.to_string());
    encode(&header, claims, &key).expect("token signs")
}

/// provider 令牌端点返回的 ID token，签名不被检查
pub fn unsigned_id_token(claims: &Value) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(b"provider-side-key"),
    )
    .expect("token signs")
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    String::from_utf8(bytes.to_vec()).expect("body is utf-8")
}

/// 取出指定名称的 `Set-Cookie` 值（只取 `name=value` 部分）
pub fn set_cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.to_string())
        })
}

/// 完整的 `Set-Cookie` 头
pub fn set_cookie_header(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|cookie| cookie.starts_with(&format!("{name}=")))
        .map(ToString::to_string)
}

pub fn session_token(record: &SessionRecord) -> String {
    codec().encode(record).expect("session encodes")
}
