//! Shared helpers for driving the router in-process.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use keygate::auth::MemoryIdentityStore;
use keygate::config::GatewayConfig;
use keygate::security::RateLimiter;
use keygate::HttpServer;

/// Defaults with the background sweeper off.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.rate_limit.sweep_interval_secs = 0;
    config
}

pub struct TestApp {
    pub router: Router,
    pub limiter: Arc<RateLimiter>,
    pub store: MemoryIdentityStore,
}

pub fn app(config: GatewayConfig) -> TestApp {
    let store = MemoryIdentityStore::new();
    let server = HttpServer::new(config, Arc::new(store.clone()));
    TestApp {
        router: server.router(),
        limiter: server.limiter(),
        store,
    }
}

/// Build a request that appears to come from `ip`.
pub fn request(method: Method, path: &str, ip: &str, headers: &[(&str, &str)], body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let mut req = builder.body(body).unwrap();
    let addr: SocketAddr = format!("{}:40000", ip).parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}

pub fn get_with_key(path: &str, ip: &str, key: &str) -> Request<Body> {
    request(Method::GET, path, ip, &[("X-API-Key", key)], Body::empty())
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Provision an identity from `ip` and return its key.
    pub async fn provision(&self, name: &str, ip: &str) -> String {
        let body = serde_json::json!({ "name": name }).to_string();
        let req = request(
            Method::POST,
            "/api/v1/users",
            ip,
            &[("content-type", "application/json")],
            Body::from(body),
        );
        let res = self.send(req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let json = body_json(res).await;
        json["api_key"].as_str().unwrap().to_string()
    }
}

pub async fn body_json(res: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
