//! Error taxonomy shared by every primerwatch crate.
//!
//! Backend failures arrive as free-text messages; `classify_backend_message`
//! folds them into the variants the UI distinguishes (auth, not-found,
//! ownership, validation, upstream).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrimerwatchError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("Upstream service unavailable: {0}")]
    Upstream(String),

    #[error("Backend error [{status}]: {message}")]
    Backend { status: u16, message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PrimerwatchError>;

impl PrimerwatchError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PrimerwatchError::Validation(msg.into())
    }

    /// Message suitable for inline display next to the triggering form.
    pub fn user_message(&self) -> String {
        match self {
            PrimerwatchError::Http(e) if e.is_timeout() => {
                "The backend did not respond in time. Please try again.".to_string()
            }
            PrimerwatchError::Http(e) if e.is_connect() => {
                "Could not reach the backend. Check your connection and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Map a backend error (HTTP status plus the procedure's message) onto the taxonomy.
pub fn classify_backend_message(status: u16, message: &str) -> PrimerwatchError {
    let msg = message.trim();
    let lower = msg.to_ascii_lowercase();

    if status == 401 || lower.contains("not authenticated") || lower.contains("jwt expired") {
        return PrimerwatchError::NotAuthenticated;
    }
    if lower.contains("does not belong to you") {
        return PrimerwatchError::Forbidden(msg.to_string());
    }
    if lower.contains("does not exist") || status == 404 {
        return PrimerwatchError::NotFound(msg.to_string());
    }
    if status == 403 {
        return PrimerwatchError::Forbidden(msg.to_string());
    }
    if matches!(status, 400 | 409 | 422)
        || lower.contains("already exists")
        || lower.contains("duplicate")
        || lower.contains("invalid")
        || lower.contains("required")
        || lower.contains("must")
    {
        return PrimerwatchError::Validation(msg.to_string());
    }
    if matches!(status, 502..=504) {
        return PrimerwatchError::Upstream(msg.to_string());
    }
    PrimerwatchError::Backend { status, message: msg.to_string() }
}

// ── HTTP mapping ──────────────────────────────────────────────────────────────

/// Error returned from JSON endpoints of the web server.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    GatewayTimeout(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PrimerwatchError> for ApiError {
    fn from(err: PrimerwatchError) -> Self {
        let message = err.user_message();
        match err {
            PrimerwatchError::NotAuthenticated => ApiError::Unauthorized(message),
            PrimerwatchError::NotFound(_) => ApiError::NotFound(message),
            PrimerwatchError::Forbidden(_) => ApiError::Forbidden(message),
            PrimerwatchError::Validation(_) => ApiError::BadRequest(message),
            PrimerwatchError::Upstream(_) => ApiError::ServiceUnavailable(message),
            PrimerwatchError::Http(ref e) if e.is_timeout() => ApiError::GatewayTimeout(message),
            PrimerwatchError::Http(ref e) if e.is_connect() => ApiError::ServiceUnavailable(message),
            _ => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
