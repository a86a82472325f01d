//! Route handlers bundled with the gateway.
//!
//! `POST /api/v1/users` provisions an identity and returns its key once.
//! `GET /api/v1/me` is the reference protected route.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{Authenticated, CredentialCodec, Identity};
use crate::http::server::AppState;
use crate::observability::metrics;

#[derive(Debug, Deserialize)]
pub struct ProvisionRequest {
    pub name: String,
}

/// Returned exactly once; the plaintext key cannot be recovered later.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProvisionResponse {
    pub id: Uuid,
    pub name: String,
    pub api_key: String,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn provision(
    State(state): State<AppState>,
    Json(body): Json<ProvisionRequest>,
) -> Response {
    let name = body.name.trim();
    if name.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "name must not be empty");
    }

    let identity = Identity::new(name);
    let issued = CredentialCodec::issue(state.api_key_length);

    if let Err(e) = state.store.insert(identity.clone(), issued.digest).await {
        tracing::error!(error = %e, "Failed to store new identity");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
    }

    metrics::record_credential_issued();
    tracing::info!(identity = %identity.id, name = %identity.name, "Identity provisioned");

    let response = ProvisionResponse {
        id: identity.id,
        name: identity.name,
        api_key: issued.api_key.expose().to_string(),
    };
    (StatusCode::CREATED, Json(response)).into_response()
}

pub async fn whoami(Authenticated(identity): Authenticated) -> Json<Identity> {
    Json(identity)
}
