//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → interceptor.rs (applicable? blocked? → 429)
//!     → handler (authenticates through crate::auth)
//!     → interceptor.rs (classify status, record into rate_limit.rs)
//! ```
//!
//! # Design Decisions
//! - Only failed authentications count toward a block
//! - Blocks lift on their own as failures leave the window
//! - Rejected requests are not recorded

pub mod interceptor;
pub mod rate_limit;

pub use interceptor::{auth_interceptor, InterceptorPolicy, InterceptorState, ResponseClass};
pub use rate_limit::RateLimiter;
