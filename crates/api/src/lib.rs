//! Administrative REST API.
//!
//! Entity lifecycle, follow management and settings, exposed under
//! `/ap/api`. Every route requires the requester address the gateway
//! propagates after authentication.

pub mod auth;
pub mod handler;
pub mod service;

pub use auth::{Requester, REQUESTER_HEADER};
pub use handler::{api_router, ApiState};
pub use service::{ApiService, EntityResponse};
