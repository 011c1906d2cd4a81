//! 请求中会话令牌的定位与 cookie 构建

use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration;

/// 会话 cookie 名称
pub const SESSION_COOKIE: &str = "jwt";
/// 授权往返期间保存 `state` 的 cookie
pub const STATE_COOKIE: &str = "oauth_state";
/// `state` cookie 的有效期（秒）
pub const STATE_COOKIE_MAX_AGE: i64 = 600;

/// 从 `Authorization: Bearer <token>` 中提取令牌
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// 定位会话令牌：Bearer 头优先，其次 `jwt` cookie
#[must_use]
pub fn resolve_session_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| {
        CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// `jwt=<token>; Path=/; HttpOnly; SameSite=Strict`，可选 `Secure`
#[must_use]
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
}

/// 授权往返期间的 `state` cookie
///
/// 回调是跨站顶层跳转，需要 `SameSite=Lax` 才会被带回。
#[must_use]
pub fn state_cookie(state: String, secure: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, state))
        .path("/auth")
        .max_age(Duration::seconds(STATE_COOKIE_MAX_AGE))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// 用于删除 `state` cookie 的同路径 cookie
#[must_use]
pub fn state_cookie_removal() -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, "")).path("/auth").build()
}

/// 读取请求中的 `state` cookie
#[must_use]
pub fn state_from_cookies(jar: &CookieJar) -> Option<String> {
    jar.get(STATE_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
