//! # 日志配置模块
//!
//! 提供统一的结构化日志宏（`linfo!` / `ldebug!` / `lwarn!` / `lerror!`）
//! 以及 tracing 订阅器的初始化。每条日志都携带 `request_id`、阶段、组件与操作名，
//! 便于按请求串联认证流程。

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 请求处理所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Shutdown,
    Configuration,
    Authentication,
    TokenExchange,
    TokenRefresh,
    SessionIssue,
    SessionVerify,
    Error,
}

impl LogStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Configuration => "configuration",
            Self::Authentication => "authentication",
            Self::TokenExchange => "token_exchange",
            Self::TokenRefresh => "token_refresh",
            Self::SessionIssue => "session_issue",
            Self::SessionVerify => "session_verify",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    Config,
    ServerSetup,
    Registry,
    Provider,
    Orchestrator,
    Guard,
    Mobile,
    Http,
}

impl LogComponent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Config => "config",
            Self::ServerSetup => "server_setup",
            Self::Registry => "registry",
            Self::Provider => "provider",
            Self::Orchestrator => "orchestrator",
            Self::Guard => "guard",
            Self::Mobile => "mobile",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结构化 INFO 日志
///
/// `linfo!(request_id, stage, component, operation, description, field = value, ...)`
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr $(, $($fields:tt)+)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $description
        )
    };
}

/// 结构化 DEBUG 日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr $(, $($fields:tt)+)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $description
        )
    };
}

/// 结构化 WARN 日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr $(, $($fields:tt)+)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $description
        )
    };
}

/// 结构化 ERROR 日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr $(, $($fields:tt)+)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $description
        )
    };
}

/// 脱敏令牌用于日志记录，格式: "eyJh***x9Qw"
#[must_use]
pub fn sanitize_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}***{tail}")
    } else {
        "***".to_string()
    }
}

/// 初始化日志系统
///
/// `RUST_LOG` 优先；否则使用 `log_level`（默认 info）并为本 crate 打开 debug。
pub fn init_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let default_filter = format!("{level},auth_broker=debug,hyper=warn,reqwest=warn");

    let filter = env::var("RUST_LOG")
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter));

    // 测试或重复初始化时忽略已安装的订阅器
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_token() {
        assert_eq!(sanitize_token("short"), "***");
        assert_eq!(sanitize_token("abcdefghijklmnop"), "abcd***mnop");
    }

    #[test]
    fn test_stage_and_component_display() {
        assert_eq!(LogStage::TokenRefresh.to_string(), "token_refresh");
        assert_eq!(LogComponent::Orchestrator.to_string(), "orchestrator");
    }

    #[test]
    fn test_macros_expand() {
        init_logging(Some("debug"));
        linfo!("test", LogStage::Startup, LogComponent::Main, "macro_info", "info line");
        ldebug!(
            "test",
            LogStage::Startup,
            LogComponent::Main,
            "macro_debug",
            "debug line",
            provider = "github"
        );
        lwarn!("test", LogStage::Error, LogComponent::Http, "macro_warn", &format!("warn {}", 1));
        lerror!(
            "test",
            LogStage::Error,
            LogComponent::Http,
            "macro_error",
            "error line",
            status = 500u16,
            detail = ?Some("x")
        );
    }
}
