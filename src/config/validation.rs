//! Configuration validation.
//!
//! Serde handles the syntax; this module checks value ranges and formats.
//! Every violation is collected so the operator sees all of them at once.

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

const MIN_KEY_LENGTH: usize = 16;
const MAX_KEY_LENGTH: usize = 256;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("auth.api_key_length must be between 16 and 256, got {0}")]
    KeyLength(usize),

    #[error("auth.api_key_header {0:?} is not a valid header name")]
    HeaderName(String),

    #[error("rate_limit.max_failed_attempts must be greater than zero")]
    ZeroAttempts,

    #[error("rate_limit.window_secs must be greater than zero")]
    ZeroWindow,

    #[error("rate_limit path {0:?} must start with '/'")]
    RelativePath(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,
}

/// Check a parsed config, returning every violation found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let len = config.auth.api_key_length;
    if !(MIN_KEY_LENGTH..=MAX_KEY_LENGTH).contains(&len) {
        errors.push(ValidationError::KeyLength(len));
    }

    if HeaderName::try_from(config.auth.api_key_header.as_str()).is_err() {
        errors.push(ValidationError::HeaderName(config.auth.api_key_header.clone()));
    }

    let limits = &config.rate_limit;
    if limits.max_failed_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }
    if limits.window_secs == 0 {
        errors.push(ValidationError::ZeroWindow);
    }
    for path in std::iter::once(&limits.protected_prefix).chain(limits.exempt_paths.iter()) {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativePath(path.clone()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
