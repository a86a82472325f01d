//! Caller-visible authentication errors.

use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::auth::store::StoreError;

/// Body text shared by both authentication failures so clients cannot tell
/// a missing key from a wrong one.
pub const AUTH_REQUIRED_MESSAGE: &str = "authentication required";
pub const RATE_LIMITED_MESSAGE: &str = "too many failed authentication attempts";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no API key presented")]
    MissingCredential,

    #[error("API key does not match any identity")]
    InvalidCredential,

    #[error("address is rate limited")]
    RateLimited,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential | AuthError::InvalidCredential => StatusCode::UNAUTHORIZED,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AuthError::MissingCredential | AuthError::InvalidCredential => AUTH_REQUIRED_MESSAGE,
            AuthError::RateLimited => RATE_LIMITED_MESSAGE,
            AuthError::Store(e) => {
                tracing::error!(error = %e, "Identity store failure during authentication");
                "internal error"
            }
        };

        let mut response = (status, Json(serde_json::json!({ "error": message }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
