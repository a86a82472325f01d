//! Identity lookup by key digest.
//!
//! The [`IdentityStore`] trait is the one capability the gateway needs from
//! persistence. [`MemoryIdentityStore`] backs development servers and tests;
//! its contents are lost when the process exits.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::credential::KeyDigest;

/// An identity that owns an API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    /// Creation time, seconds since epoch.
    pub created_at: u64,
}

impl Identity {
    /// A new identity with a random id, created now.
    pub fn new(name: impl Into<String>) -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at,
        }
    }
}

/// Failure inside the storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("an identity already holds this key digest")]
    DuplicateDigest,
}

/// Persistence capability consumed by the resolver and provisioning.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Find the identity whose stored digest equals `digest`.
    ///
    /// `Ok(None)` means no such identity; errors are reserved for the
    /// backend itself failing.
    async fn find_by_digest(&self, digest: &KeyDigest) -> Result<Option<Identity>, StoreError>;

    /// Persist a new identity under its key digest.
    async fn insert(&self, identity: Identity, digest: KeyDigest) -> Result<(), StoreError>;
}

/// In-memory store keyed by digest.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityStore {
    inner: Arc<DashMap<KeyDigest, Identity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities.
    pub fn count(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_digest(&self, digest: &KeyDigest) -> Result<Option<Identity>, StoreError> {
        Ok(self.inner.get(digest).map(|r| r.value().clone()))
    }

    async fn insert(&self, identity: Identity, digest: KeyDigest) -> Result<(), StoreError> {
        match self.inner.entry(digest) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::DuplicateDigest),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(identity);
                Ok(())
            }
        }
    }
}
