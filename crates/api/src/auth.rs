//! Requester identity extraction.
//!
//! The gateway terminates authentication and propagates the registered
//! requester's address in a trusted header. Routes bail with 403 when it is
//! absent.

use axum::{extract::FromRequestParts, http::request::Parts};
use ccbridge_common::AppError;

/// Header carrying the authenticated requester's address.
pub const REQUESTER_HEADER: &str = "cc-requester-ccid";

/// Authenticated requester address.
#[derive(Debug, Clone)]
pub struct Requester(pub String);

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(REQUESTER_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .ok_or_else(|| AppError::Forbidden("requester not found".to_string()))
    }
}
