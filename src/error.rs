use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Unified error type for the install service.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    // ── Request Errors ──────────────────────────────────────────────────
    #[error("Invalid request parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Webhook signature rejected")]
    Unauthorized,

    // ── Platform Errors ─────────────────────────────────────────────────
    #[error("Unsupported API version: {0}")]
    UnsupportedApiVersion(String),

    #[error("Shopify error: {0}")]
    Platform(String),

    // ── Internal ────────────────────────────────────────────────────────
    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for InstallError {
    fn from(e: std::io::Error) -> Self {
        tracing::error!("Token file error: {e}");
        InstallError::Storage(e.to_string())
    }
}

impl From<anyhow::Error> for InstallError {
    fn from(e: anyhow::Error) -> Self {
        InstallError::Internal(e.to_string())
    }
}

impl InstallError {
    pub fn status(&self) -> StatusCode {
        match self {
            InstallError::InvalidParams(_)
            | InstallError::InvalidState
            | InstallError::BadRequest(_) => StatusCode::BAD_REQUEST,
            InstallError::Unauthorized => StatusCode::UNAUTHORIZED,
            InstallError::UnsupportedApiVersion(_) => StatusCode::SERVICE_UNAVAILABLE,
            InstallError::Platform(_) => StatusCode::BAD_GATEWAY,
            InstallError::Storage(_) | InstallError::Crypto(_) | InstallError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            InstallError::InvalidParams(_) => "invalid_params",
            InstallError::InvalidState => "invalid_state",
            InstallError::BadRequest(_) => "bad_request",
            InstallError::Unauthorized => "unauthorized",
            InstallError::UnsupportedApiVersion(_) => "unsupported_api_version",
            InstallError::Platform(_) => "platform_error",
            InstallError::Storage(_) => "storage_error",
            InstallError::Crypto(_) => "crypto_error",
            InstallError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for InstallError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });

        (self.status(), axum::Json(body)).into_response()
    }
}
