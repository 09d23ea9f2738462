//! Native platform contract surface.
//!
//! Schema constants, the signed document model, the proxy document signer
//! and the gateway HTTP client. Everything the bridge needs from the
//! platform side lives here; the platform itself is an external service.

pub mod client;
pub mod consts;
pub mod document;
pub mod signer;
pub mod world;

pub use client::{GatewayClient, Options};
pub use document::{
    Association, AssociationDocument, Commit, CommitOption, DeleteDocument, DocumentHead,
    EntityInfo, Event, Message, MessageDocument, ProfileDocument, ProfileRecord, ResponseBase,
    TimelineDocument, TimelineItem, TimelineRecord,
};
pub use signer::{create_token, derive_ccid, sign_document};
