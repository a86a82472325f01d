//! Failed-authentication throttling middleware.
//!
//! Wraps every request. Applicable requests are rejected up front while
//! their address is blocked; otherwise the handler runs and its status is
//! classified and recorded into the [`RateLimiter`].
//!
//! A request whose future is dropped mid-handler (client disconnect,
//! timeout) never reaches the recording step and so counts as neutral.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::error::AuthError;
use crate::auth::extract::{CredentialSource, HeaderSource};
use crate::config::RateLimitConfig;
use crate::http::request::client_address;
use crate::observability::metrics;
use crate::security::rate_limit::RateLimiter;

/// How a finished response bears on an address's failure history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// Authenticated and served.
    Success,
    /// Authentication rejected.
    Failure,
    /// Not an authentication signal; not recorded.
    Neutral,
}

impl ResponseClass {
    pub fn from_status(status: StatusCode) -> Self {
        if status.is_success() {
            ResponseClass::Success
        } else if status == StatusCode::UNAUTHORIZED {
            ResponseClass::Failure
        } else {
            ResponseClass::Neutral
        }
    }

    /// `Some(succeeded)` for classes that go into the ledger.
    pub fn as_attempt(self) -> Option<bool> {
        match self {
            ResponseClass::Success => Some(true),
            ResponseClass::Failure => Some(false),
            ResponseClass::Neutral => None,
        }
    }
}

/// Which requests the throttle looks at.
#[derive(Debug, Clone)]
pub struct InterceptorPolicy {
    pub enabled: bool,
    pub protected_prefix: String,
    pub exempt_paths: Vec<String>,
    pub key_source: HeaderSource,
}

impl InterceptorPolicy {
    pub fn new(config: &RateLimitConfig, api_key_header: HeaderName) -> Self {
        Self {
            enabled: config.enabled,
            protected_prefix: config.protected_prefix.clone(),
            exempt_paths: config.exempt_paths.clone(),
            key_source: HeaderSource::new(api_key_header),
        }
    }

    /// Protected path, not a provisioning path, and carrying a non-empty key
    /// header.
    ///
    /// Requests without any key are left to fail authentication normally.
    /// Presence is judged by the same extraction the resolver uses, so an
    /// empty header is treated as no key at all.
    pub fn applies_to(&self, request: &Request<Body>) -> bool {
        let path = request.uri().path();
        self.enabled
            && path.starts_with(&self.protected_prefix)
            && !self.exempt_paths.iter().any(|exempt| exempt == path)
            && self.key_source.extract(request.headers()).is_some()
    }
}

/// Middleware state: the shared ledger plus the applicability policy.
#[derive(Clone)]
pub struct InterceptorState {
    pub limiter: Arc<RateLimiter>,
    pub policy: Arc<InterceptorPolicy>,
}

pub async fn auth_interceptor(
    State(state): State<InterceptorState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.policy.applies_to(&request) {
        return next.run(request).await;
    }

    let address = client_address(request.extensions());

    if state.limiter.is_blocked(&address) {
        tracing::warn!(
            client = %address,
            path = %request.uri().path(),
            "Rejected request from rate limited address"
        );
        metrics::record_rate_limited();
        return AuthError::RateLimited.into_response();
    }

    let response = next.run(request).await;

    if let Some(succeeded) = ResponseClass::from_status(response.status()).as_attempt() {
        state.limiter.record_attempt(&address, succeeded);
    }

    response
}
