//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, auth throttling)
//! - Bind server to listener
//! - Run the ledger sweeper alongside the server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::FromRef,
    http::HeaderName,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{IdentityResolver, IdentityStore};
use crate::config::{AuthConfig, GatewayConfig};
use crate::http::handlers;
use crate::security::{auth_interceptor, InterceptorPolicy, InterceptorState, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<IdentityResolver>,
    pub store: Arc<dyn IdentityStore>,
    pub limiter: Arc<RateLimiter>,
    pub policy: Arc<InterceptorPolicy>,
    pub api_key_length: usize,
}

impl FromRef<AppState> for Arc<IdentityResolver> {
    fn from_ref(state: &AppState) -> Self {
        state.resolver.clone()
    }
}

/// Parse the configured key header, falling back to `x-api-key`.
///
/// Validated configs never hit the fallback.
pub fn api_key_header(config: &AuthConfig) -> HeaderName {
    HeaderName::try_from(config.api_key_header.as_str()).unwrap_or_else(|_| {
        tracing::warn!(header = %config.api_key_header, "Invalid API key header name, using x-api-key");
        HeaderName::from_static("x-api-key")
    })
}

impl AppState {
    pub fn new(config: &GatewayConfig, store: Arc<dyn IdentityStore>) -> Self {
        let header = api_key_header(&config.auth);
        let resolver = IdentityResolver::with_default_sources(store.clone(), header.clone());
        Self {
            resolver: Arc::new(resolver),
            store,
            limiter: Arc::new(RateLimiter::from_config(&config.rate_limit)),
            policy: Arc::new(InterceptorPolicy::new(&config.rate_limit, header)),
            api_key_length: config.auth.api_key_length,
        }
    }

    pub fn interceptor_state(&self) -> InterceptorState {
        InterceptorState {
            limiter: self.limiter.clone(),
            policy: self.policy.clone(),
        }
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &GatewayConfig, state: AppState) -> Router {
    let interceptor = state.interceptor_state();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/users", post(handlers::provision))
        .route("/api/v1/me", get(handlers::whoami))
        .with_state(state)
        .layer(middleware::from_fn_with_state(interceptor, auth_interceptor))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server backed by `store`.
    pub fn new(config: GatewayConfig, store: Arc<dyn IdentityStore>) -> Self {
        let state = AppState::new(&config, store);
        let limiter = state.limiter.clone();
        let router = build_router(&config, state);
        Self {
            router,
            config,
            limiter,
        }
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the shared failure ledger.
    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_failed_attempts = self.limiter.max_failed_attempts(),
            window_secs = self.limiter.window().as_secs(),
            "HTTP server starting"
        );

        let sweep_secs = self.config.rate_limit.sweep_interval_secs;
        let sweeper = (sweep_secs > 0)
            .then(|| self.limiter.spawn_sweeper(Duration::from_secs(sweep_secs), shutdown.resubscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
