//! 会话令牌：记录结构、签发校验、请求提取与路由守卫

mod codec;
mod extract;
mod guard;
mod record;

pub use codec::SessionCodec;
pub use extract::{
    SESSION_COOKIE, STATE_COOKIE, STATE_COOKIE_MAX_AGE, bearer_token, resolve_session_token,
    session_cookie, state_cookie, state_cookie_removal, state_from_cookies,
};
pub use guard::{SessionGuard, require_session};
pub use record::SessionRecord;
