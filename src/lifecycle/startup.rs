//! Startup orchestration.
//!
//! Config is already loaded and validated by the time this runs. Metrics
//! come up first, then the server is built, then the listener is bound so
//! traffic arrives only once everything is ready.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::auth::IdentityStore;
use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::observability::metrics;

/// Build the server and bind its listener.
pub async fn prepare(
    config: GatewayConfig,
    store: Arc<dyn IdentityStore>,
) -> Result<(HttpServer, TcpListener), std::io::Error> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, store);

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    Ok((server, listener))
}
