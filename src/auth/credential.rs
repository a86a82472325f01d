//! API key generation, hashing and verification.
//!
//! Keys are drawn from the OS CSPRNG and only their SHA-256 digest is ever
//! handed to storage. The plaintext key exists in memory just long enough to
//! be returned to its owner once.

use std::fmt;

use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of keys issued when no other length is configured.
pub const DEFAULT_KEY_LENGTH: usize = 32;

/// A plaintext API key.
///
/// `Debug` is redacted so keys never end up in log lines by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key presented by a client.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key. Call sites that need this are returning it to the owner.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

/// Lowercase hex SHA-256 of an [`ApiKey`]; the only persisted form of a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyDigest(String);

impl KeyDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A freshly issued key together with the digest to store.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub api_key: ApiKey,
    pub digest: KeyDigest,
}

/// Stateless key codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialCodec;

impl CredentialCodec {
    /// Draw `length` characters uniformly from `[A-Za-z0-9]`.
    ///
    /// # Panics
    ///
    /// Panics if the operating system cannot supply randomness. There is
    /// no fallback generator.
    pub fn generate(length: usize) -> ApiKey {
        ApiKey(Alphanumeric.sample_string(&mut OsRng, length))
    }

    /// SHA-256 of the key's UTF-8 bytes, hex encoded.
    pub fn digest(key: &str) -> KeyDigest {
        KeyDigest(hex::encode(Sha256::digest(key.as_bytes())))
    }

    /// Whether `presented` hashes to `stored`.
    pub fn verify(presented: &ApiKey, stored: &KeyDigest) -> bool {
        let computed = Self::digest(presented.expose());
        computed.0.as_bytes().ct_eq(stored.0.as_bytes()).into()
    }

    /// Generate a key and its digest for provisioning.
    pub fn issue(length: usize) -> IssuedCredential {
        let api_key = Self::generate(length);
        let digest = Self::digest(api_key.expose());
        IssuedCredential { api_key, digest }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_length_and_alphabet() {
        let key = CredentialCodec::generate(DEFAULT_KEY_LENGTH);
        assert_eq!(key.len(), 32);
        assert!(key.expose().chars().all(|c| c.is_ascii_alphanumeric()));

        let long = CredentialCodec::generate(100);
        assert_eq!(long.len(), 100);
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = CredentialCodec::generate(DEFAULT_KEY_LENGTH);
        let b = CredentialCodec::generate(DEFAULT_KEY_LENGTH);
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_known_vector() {
        let digest = CredentialCodec::digest("abc");
        assert_eq!(
            digest.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        let key = CredentialCodec::generate(DEFAULT_KEY_LENGTH);
        let first = CredentialCodec::digest(key.expose());
        let second = CredentialCodec::digest(key.expose());
        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
    }

    #[test]
    fn test_verify() {
        let issued = CredentialCodec::issue(DEFAULT_KEY_LENGTH);
        assert!(CredentialCodec::verify(&issued.api_key, &issued.digest));

        let other = CredentialCodec::issue(DEFAULT_KEY_LENGTH);
        assert!(!CredentialCodec::verify(&issued.api_key, &other.digest));
        assert!(!CredentialCodec::verify(&other.api_key, &issued.digest));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = ApiKey::new("super-secret");
        assert_eq!(format!("{:?}", key), "ApiKey([REDACTED])");
    }
}
