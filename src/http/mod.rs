//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, trace)
//!     → security::interceptor (throttle check)
//!     → handlers.rs (provision / protected routes)
//!     → security::interceptor (record outcome)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod server;

pub use request::client_address;
pub use server::{build_router, AppState, HttpServer};
