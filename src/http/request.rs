//! Request inspection helpers.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Extensions;

/// Address used when the connection info is unavailable (e.g. in-process calls).
pub const UNKNOWN_CLIENT: &str = "unknown";

/// The peer IP of the connection that carried the request.
///
/// Ports are dropped so every connection from one host shares a key.
pub fn client_address(extensions: &Extensions) -> String {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_address_uses_ip_only() {
        let mut extensions = Extensions::new();
        let addr: SocketAddr = "1.2.3.4:5555".parse().unwrap();
        extensions.insert(ConnectInfo(addr));
        assert_eq!(client_address(&extensions), "1.2.3.4");
    }

    #[test]
    fn test_client_address_fallback() {
        assert_eq!(client_address(&Extensions::new()), UNKNOWN_CLIENT);
    }
}
