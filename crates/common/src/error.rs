//! Error types for ccbridge.
//!
//! One unified error type for the whole bridge. Handlers map kinds to HTTP
//! status codes; the inbox handler deliberately bypasses this mapping and
//! answers 200 regardless (remote AP servers retry on anything else).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client errors (4xx) ===
    /// Generic not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Local entity not found.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// Native message not found.
    #[error("message not found: {0}")]
    MessageNotFound(String),

    /// Cross-reference row not found.
    #[error("object reference not found: {0}")]
    ReferenceNotFound(String),

    /// Malformed request or activity.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No authenticated requester.
    #[error("unauthorized")]
    Unauthorized,

    /// Requester lacks access.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Duplicate resource.
    #[error("conflict: {0}")]
    Conflict(String),

    // === Server errors (5xx) ===
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Redis operation failed.
    #[error("redis error: {0}")]
    Redis(String),

    /// Remote AP server interaction failed.
    #[error("federation error: {0}")]
    Federation(String),

    /// Native gateway call failed.
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Signing or key material failure.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_)
            | Self::EntityNotFound(_)
            | Self::MessageNotFound(_)
            | Self::ReferenceNotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_)
            | Self::Redis(_)
            | Self::Federation(_)
            | Self::Gateway(_)
            | Self::Crypto(_)
            | Self::Config(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::EntityNotFound(_) => "ENTITY_NOT_FOUND",
            Self::MessageNotFound(_) => "MESSAGE_NOT_FOUND",
            Self::ReferenceNotFound(_) => "REFERENCE_NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::Federation(_) => "FEDERATION_ERROR",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Crypto(_) => "CRYPTO_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Wraps the error with a call-site prefix, preserving the kind.
    #[must_use]
    pub fn context(self, prefix: &str) -> Self {
        match self {
            Self::NotFound(m) => Self::NotFound(format!("{prefix}: {m}")),
            Self::EntityNotFound(m) => Self::EntityNotFound(format!("{prefix}: {m}")),
            Self::MessageNotFound(m) => Self::MessageNotFound(format!("{prefix}: {m}")),
            Self::ReferenceNotFound(m) => Self::ReferenceNotFound(format!("{prefix}: {m}")),
            Self::BadRequest(m) => Self::BadRequest(format!("{prefix}: {m}")),
            Self::Forbidden(m) => Self::Forbidden(format!("{prefix}: {m}")),
            Self::Conflict(m) => Self::Conflict(format!("{prefix}: {m}")),
            Self::Database(m) => Self::Database(format!("{prefix}: {m}")),
            Self::Redis(m) => Self::Redis(format!("{prefix}: {m}")),
            Self::Federation(m) => Self::Federation(format!("{prefix}: {m}")),
            Self::Gateway(m) => Self::Gateway(format!("{prefix}: {m}")),
            Self::Crypto(m) => Self::Crypto(format!("{prefix}: {m}")),
            Self::Internal(m) => Self::Internal(format!("{prefix}: {m}")),
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "server error");
        } else {
            tracing::debug!(error = %self, code = code, "client error");
        }

        let body = Json(json!({
            "status": "error",
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("invalid json: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::EntityNotFound("alice".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::BadRequest("invalid to".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Gateway("commit rejected".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_context_preserves_kind() {
        let err = AppError::Federation("timeout".into()).context("ap/service/inbox/follow FetchPerson");
        assert_eq!(err.error_code(), "FEDERATION_ERROR");
        assert!(err.to_string().contains("ap/service/inbox/follow FetchPerson"));
        assert!(err.to_string().contains("timeout"));
    }
}
