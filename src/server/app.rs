//! # 认证服务器
//!
//! 组装 axum 路由、共享状态与中间件，并负责监听与优雅停机。

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use url::Url;

use super::middleware::request_id_middleware;
use crate::auth::{AuthOrchestrator, GoogleIdTokenVerifier, OrchestratorOptions};
use crate::config::AppConfig;
use crate::error::{BrokerError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::provider::{ProviderHttp, ProviderRegistry};
use crate::session::{SessionCodec, SessionGuard};
use crate::{linfo, lwarn};

/// 路由共享状态，全部只读
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AuthOrchestrator>,
    pub guard: Arc<SessionGuard>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub const fn new(
        orchestrator: Arc<AuthOrchestrator>,
        guard: Arc<SessionGuard>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            orchestrator,
            guard,
            config,
        }
    }

    /// 按配置装配 registry、codec、ID token 校验器与编排器
    ///
    /// 所有 provider 与 JWKS 拉取共用一个 HTTP 客户端。
    pub fn from_config(config: AppConfig) -> Result<Self> {
        crate::ensure_config!(
            !config.session.jwt_secret.is_empty(),
            "session.jwt_secret must be set"
        );

        let http = ProviderHttp::new(Duration::from_secs(config.providers.request_timeout_secs))?;
        let registry = Arc::new(ProviderRegistry::with_http(&config.providers, &http)?);

        let jwks_url = Url::parse(&config.mobile.jwks_url).map_err(|e| {
            BrokerError::config_with_source(
                format!("Invalid mobile.jwks_url '{}'", config.mobile.jwks_url),
                e,
            )
        })?;
        let verifier = Arc::new(GoogleIdTokenVerifier::new(
            http.client().clone(),
            jwks_url,
            Duration::from_secs(config.mobile.jwks_cache_ttl_secs),
        ));

        let secret = config.session.jwt_secret.as_bytes();
        let codec = Arc::new(SessionCodec::new(secret));
        let orchestrator = Arc::new(AuthOrchestrator::new(
            registry,
            Arc::clone(&codec),
            verifier,
            secret,
            OrchestratorOptions {
                verify_state: config.session.verify_state,
                allowed_client_ids: config.mobile.allowed_client_ids.clone(),
            },
        ));
        let guard = Arc::new(SessionGuard::new(codec));

        Ok(Self::new(orchestrator, guard, Arc::new(config)))
    }

    /// 会话 cookie 是否带 `Secure`
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.config.session.cookie_secure
    }
}

/// 认证服务器
pub struct AuthServer {
    bind_address: String,
    router: Router,
}

impl AuthServer {
    /// 创建服务器
    #[must_use]
    pub fn new(state: AppState) -> Self {
        if state.orchestrator.registry().is_empty() {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "no_web_providers",
                "No OAuth provider is configured, only the mobile flow is available"
            );
        }
        let bind_address = state.config.server.bind_address();
        let router = Self::create_router(state);
        Self {
            bind_address,
            router,
        }
    }

    /// 创建路由器
    #[must_use]
    pub fn create_router(state: AppState) -> Router {
        let cors = build_cors_layer(&state.config.server.cors_origins);

        let mut app = super::routes::create_routes(state);

        let service_builder = ServiceBuilder::new().layer(TraceLayer::new_for_http());
        app = match cors {
            Some(cors_layer) => app.layer(service_builder.layer(cors_layer)),
            None => app.layer(service_builder),
        };

        // 最外层，保证守卫与处理器都能拿到 RequestId
        app.layer(axum::middleware::from_fn(request_id_middleware))
    }

    #[must_use]
    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// 启动服务器，收到 Ctrl-C 后优雅退出
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(&self.bind_address).await.map_err(|e| {
            BrokerError::server_start_with_source(
                format!("Failed to bind {}", self.bind_address),
                e,
            )
        })?;
        let addr = listener
            .local_addr()
            .map_err(|e| BrokerError::server_start_with_source("Failed to read local address", e))?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("Starting auth broker on {addr}")
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| BrokerError::server_start_with_source("Auth broker server error", e))?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stopped",
            "Auth broker stopped"
        );
        Ok(())
    }
}

/// 空列表不启用 CORS；包含 `*` 时允许任意源（此时不能携带凭证）
fn build_cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
        ]);

    if origins.iter().any(|origin| origin == "*") {
        return Some(layer.allow_origin(Any));
    }

    let parsed = origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<std::result::Result<Vec<_>, _>>();

    match parsed {
        Ok(origins) => Some(layer.allow_origin(origins).allow_credentials(true)),
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "cors_config_fail",
                &format!("Invalid CORS origin configuration: {e}, CORS disabled")
            );
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lwarn!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "signal_handler_fail",
            &format!("Failed to listen for Ctrl-C: {e}")
        );
        std::future::pending::<()>().await;
    }
    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::ServerSetup,
        "shutdown_signal",
        "Shutdown signal received"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_disabled_without_origins() {
        assert!(build_cors_layer(&[]).is_none());
    }

    #[test]
    fn test_cors_enabled_for_explicit_and_wildcard_origins() {
        assert!(build_cors_layer(&["http://localhost:3000".to_string()]).is_some());
        assert!(build_cors_layer(&["*".to_string()]).is_some());
    }

    #[test]
    fn test_invalid_origin_disables_cors() {
        assert!(build_cors_layer(&["bad\norigin".to_string()]).is_none());
    }
}
