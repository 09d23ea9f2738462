//! ActivityPub-facing service: actor documents, discovery endpoints and the
//! authenticated inbox pipeline.

pub mod handler;
pub mod processor;
pub mod service;

pub use handler::{ap_router, well_known_router, ApState};
pub use service::ApService;
