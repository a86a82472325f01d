//! Credential extraction strategies.
//!
//! # Responsibilities
//! - Pull a plaintext key out of request headers
//! - Report which transport supplied it (for audit logs)
//!
//! # Design Decisions
//! - Sources are tried in order; the first hit wins
//! - Empty values count as absent
//! - Non-UTF-8 values are decoded lossily and left to fail lookup

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::auth::credential::ApiKey;

/// A place in the request where a client may put its API key.
pub trait CredentialSource: Send + Sync + std::fmt::Debug {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// The key carried by this transport, if any.
    fn extract(&self, headers: &HeaderMap) -> Option<ApiKey>;
}

fn decode(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

/// A dedicated header whose whole value is the key.
#[derive(Debug, Clone)]
pub struct HeaderSource {
    header: HeaderName,
}

impl HeaderSource {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl CredentialSource for HeaderSource {
    fn name(&self) -> &'static str {
        "header"
    }

    fn extract(&self, headers: &HeaderMap) -> Option<ApiKey> {
        let raw = decode(headers.get(&self.header)?);
        let key = raw.trim();
        (!key.is_empty()).then(|| ApiKey::new(key))
    }
}

/// `Authorization: Bearer <key>`. The scheme is matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct BearerSource;

impl CredentialSource for BearerSource {
    fn name(&self) -> &'static str {
        "bearer"
    }

    fn extract(&self, headers: &HeaderMap) -> Option<ApiKey> {
        let raw = decode(headers.get(AUTHORIZATION)?);
        let (scheme, token) = raw.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        (!token.is_empty()).then(|| ApiKey::new(token))
    }
}

/// Try each source in order and return the first key found with its label.
pub fn extract_first(
    sources: &[Box<dyn CredentialSource>],
    headers: &HeaderMap,
) -> Option<(&'static str, ApiKey)> {
    sources
        .iter()
        .find_map(|source| source.extract(headers).map(|key| (source.name(), key)))
}
