//! End-to-end authentication and throttling through the full router.

use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{Method, StatusCode};

mod common;

use common::{app, body_json, get_with_key, request, test_config};

const ATTACKER: &str = "1.2.3.4";

#[tokio::test(start_paused = true)]
async fn test_lockout_and_recovery() {
    let app = app(test_config());
    let key = app.provision("alice", ATTACKER).await;

    for _ in 0..5 {
        let res = app.send(get_with_key("/api/v1/me", ATTACKER, "wrong-key")).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(res).await["error"], "authentication required");
    }
    assert_eq!(app.limiter.failure_count(ATTACKER), 5);

    // Blocked even with the right key; the handler is never reached.
    let res = app.send(get_with_key("/api/v1/me", ATTACKER, &key)).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(res).await["error"], "too many failed authentication attempts");
    assert_eq!(app.limiter.recorded_attempts(ATTACKER), 5);

    // Provisioning stays reachable for the blocked address.
    app.provision("bob", ATTACKER).await;

    // Other addresses are unaffected.
    let res = app.send(get_with_key("/api/v1/me", "5.6.7.8", &key)).await;
    assert_eq!(res.status(), StatusCode::OK);

    tokio::time::advance(Duration::from_secs(301)).await;

    let res = app.send(get_with_key("/api/v1/me", ATTACKER, &key)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["name"], "alice");
    assert_eq!(app.limiter.failure_count(ATTACKER), 0);
    assert_eq!(app.limiter.recorded_attempts(ATTACKER), 1);
}

#[tokio::test]
async fn test_authenticated_request_returns_identity() {
    let app = app(test_config());
    let key = app.provision("carol", "10.0.0.1").await;

    let res = app.send(get_with_key("/api/v1/me", "10.0.0.1", &key)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let json = body_json(res).await;
    assert_eq!(json["name"], "carol");
    assert!(json["id"].is_string());

    let bearer = format!("Bearer {}", key);
    let res = app
        .send(request(Method::GET, "/api/v1/me", "10.0.0.1", &[("authorization", bearer.as_str())], Body::empty()))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_and_invalid_are_indistinguishable() {
    let app = app(test_config());

    let missing = app
        .send(request(Method::GET, "/api/v1/me", "10.0.0.2", &[], Body::empty()))
        .await;
    let invalid = app.send(get_with_key("/api/v1/me", "10.0.0.2", "nope")).await;

    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(missing.headers().get(WWW_AUTHENTICATE), invalid.headers().get(WWW_AUTHENTICATE));
    assert_eq!(body_json(missing).await, body_json(invalid).await);
}

#[tokio::test]
async fn test_requests_without_key_header_are_not_counted() {
    let app = app(test_config());

    for _ in 0..10 {
        let res = app
            .send(request(Method::GET, "/api/v1/me", "10.0.0.3", &[], Body::empty()))
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .send(request(
                Method::GET,
                "/api/v1/me",
                "10.0.0.3",
                &[(AUTHORIZATION.as_str(), "Bearer wrong")],
                Body::empty(),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(app.limiter.recorded_attempts("10.0.0.3"), 0);
    assert!(!app.limiter.is_blocked("10.0.0.3"));
}

#[tokio::test]
async fn test_empty_key_header_is_not_counted() {
    let app = app(test_config());

    for _ in 0..10 {
        let res = app.send(get_with_key("/api/v1/me", "10.0.0.8", "")).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(app.limiter.recorded_attempts("10.0.0.8"), 0);
    assert!(!app.limiter.is_blocked("10.0.0.8"));

    let key = app.provision("after-empty", "10.0.0.8").await;
    let res = app.send(get_with_key("/api/v1/me", "10.0.0.8", &key)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_neutral_responses_are_not_recorded() {
    let app = app(test_config());

    let res = app.send(get_with_key("/api/v1/nothing-here", "10.0.0.4", "k")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .send(request(Method::POST, "/api/v1/me", "10.0.0.4", &[("X-API-Key", "k")], Body::empty()))
        .await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    let res = app
        .send(request(
            Method::POST,
            "/api/v1/users",
            "10.0.0.4",
            &[("content-type", "application/json"), ("X-API-Key", "k")],
            Body::from(r#"{"name": "  "}"#),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.limiter.recorded_attempts("10.0.0.4"), 0);
}

#[tokio::test]
async fn test_successes_do_not_reset_failures() {
    let mut config = test_config();
    config.rate_limit.max_failed_attempts = 3;
    let app = app(config);
    let key = app.provision("dave", "10.0.0.5").await;

    for _ in 0..2 {
        app.send(get_with_key("/api/v1/me", "10.0.0.5", "bad")).await;
    }
    for _ in 0..5 {
        let res = app.send(get_with_key("/api/v1/me", "10.0.0.5", &key)).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
    assert_eq!(app.limiter.failure_count("10.0.0.5"), 2);

    app.send(get_with_key("/api/v1/me", "10.0.0.5", "bad")).await;
    let res = app.send(get_with_key("/api/v1/me", "10.0.0.5", &key)).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_disabled_throttle_never_blocks() {
    let mut config = test_config();
    config.rate_limit.enabled = false;
    let app = app(config);

    for _ in 0..20 {
        let res = app.send(get_with_key("/api/v1/me", "10.0.0.6", "bad")).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
    assert_eq!(app.limiter.tracked_addresses(), 0);
}

#[tokio::test]
async fn test_custom_header_name() {
    let mut config = test_config();
    config.auth.api_key_header = "X-Service-Token".into();
    let app = app(config);
    let key = app.provision("erin", "10.0.0.7").await;

    let res = app
        .send(request(Method::GET, "/api/v1/me", "10.0.0.7", &[("X-Service-Token", key.as_str())], Body::empty()))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.send(get_with_key("/api/v1/me", "10.0.0.7", &key)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
