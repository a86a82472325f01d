//! API key authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Provisioning:
//!     credential.rs (generate key, SHA-256 digest)
//!     → store.rs (persist identity under digest)
//!     → plaintext key returned to the caller once
//!
//! Protected request:
//!     resolver.rs (Authenticated extractor)
//!     → extract.rs (header / bearer sources, in order)
//!     → store.rs (lookup by digest)
//!     → handler runs, or error.rs rejects with 401
//! ```
//!
//! # Design Decisions
//! - Plaintext keys are never stored or logged
//! - Missing and wrong keys are indistinguishable to clients

pub mod credential;
pub mod error;
pub mod extract;
pub mod resolver;
pub mod store;

pub use credential::{ApiKey, CredentialCodec, IssuedCredential, KeyDigest};
pub use error::AuthError;
pub use resolver::{AuthOutcome, Authenticated, IdentityResolver};
pub use store::{Identity, IdentityStore, MemoryIdentityStore, StoreError};
