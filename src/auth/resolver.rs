//! Request → identity resolution.
//!
//! # Data Flow
//! ```text
//! request headers
//!     → extract.rs (X-API-Key, then Authorization: Bearer)
//!     → credential.rs (SHA-256 digest)
//!     → IdentityStore::find_by_digest
//!     → AuthOutcome
//! ```

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};

use crate::auth::credential::CredentialCodec;
use crate::auth::error::AuthError;
use crate::auth::extract::{extract_first, BearerSource, CredentialSource, HeaderSource};
use crate::auth::store::{Identity, IdentityStore, StoreError};
use crate::http::request::client_address;
use crate::observability::metrics;

/// Result of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(Identity),
    MissingCredential,
    InvalidCredential,
}

impl AuthOutcome {
    /// Label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AuthOutcome::Authenticated(_) => "authenticated",
            AuthOutcome::MissingCredential => "missing",
            AuthOutcome::InvalidCredential => "invalid",
        }
    }

    pub fn into_result(self) -> Result<Identity, AuthError> {
        match self {
            AuthOutcome::Authenticated(identity) => Ok(identity),
            AuthOutcome::MissingCredential => Err(AuthError::MissingCredential),
            AuthOutcome::InvalidCredential => Err(AuthError::InvalidCredential),
        }
    }
}

/// Maps request headers to an identity through an ordered list of sources.
pub struct IdentityResolver {
    sources: Vec<Box<dyn CredentialSource>>,
    store: Arc<dyn IdentityStore>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>, sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources, store }
    }

    /// The standard chain: `api_key_header` first, then the bearer scheme.
    pub fn with_default_sources(store: Arc<dyn IdentityStore>, api_key_header: HeaderName) -> Self {
        Self::new(
            store,
            vec![
                Box::new(HeaderSource::new(api_key_header)),
                Box::new(BearerSource),
            ],
        )
    }

    /// Resolve the identity behind a request.
    ///
    /// Unknown or malformed keys are an [`AuthOutcome::InvalidCredential`];
    /// only a failing store produces an error.
    pub async fn resolve(&self, headers: &HeaderMap, address: &str) -> Result<AuthOutcome, StoreError> {
        let outcome = match extract_first(&self.sources, headers) {
            None => {
                tracing::debug!(target: "keygate::audit", client = %address, outcome = "missing", "No API key presented");
                AuthOutcome::MissingCredential
            }
            Some((source, key)) => {
                let digest = CredentialCodec::digest(key.expose());
                match self.store.find_by_digest(&digest).await? {
                    Some(identity) => {
                        tracing::info!(
                            target: "keygate::audit",
                            client = %address,
                            source,
                            identity = %identity.id,
                            outcome = "authenticated",
                            "API key accepted"
                        );
                        AuthOutcome::Authenticated(identity)
                    }
                    None => {
                        tracing::warn!(
                            target: "keygate::audit",
                            client = %address,
                            source,
                            outcome = "invalid",
                            "API key rejected"
                        );
                        AuthOutcome::InvalidCredential
                    }
                }
            }
        };

        metrics::record_auth_outcome(outcome.label());
        Ok(outcome)
    }
}

/// Extractor for handlers that require a caller identity.
///
/// Rejects with [`AuthError`] before the handler body runs.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl<S> FromRequestParts<S> for Authenticated
where
    Arc<IdentityResolver>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let resolver = Arc::<IdentityResolver>::from_ref(state);
        let address = client_address(&parts.extensions);
        let outcome = resolver.resolve(&parts.headers, &address).await?;
        outcome.into_result().map(Authenticated)
    }
}
