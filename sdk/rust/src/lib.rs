//! Client for the keygate HTTP API.

pub mod client;

pub use client::{IdentityInfo, KeygateClient, ProvisionResponse};
