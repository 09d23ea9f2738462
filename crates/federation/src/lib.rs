//! ActivityPub wire layer for ccbridge.
//!
//! Dynamic AP object trees, wire types, HTTP Signatures, the remote Person
//! cache and the signed outbound client.

pub mod cache;
pub mod client;
pub mod objects;
pub mod raw;
pub mod signature;

pub use cache::PersonCache;
pub use client::{ApClient, AS_PUBLIC, USER_AGENT};
pub use objects::{
    AccountStats, ApObject, Attachment, Icon, Key, NodeInfo, NodeInfoMaintainer, NodeInfoMetadata,
    NodeInfoSoftware, PersonEndpoints, Tag, WebFinger, WebFingerLink, WellKnown, WellKnownLink,
};
pub use raw::RawApObj;
pub use signature::{HttpSigner, HttpVerifier, SignatureComponents, SignatureError};
