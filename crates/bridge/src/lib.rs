//! Translation between ActivityPub Notes and Native message documents.

pub mod html;
mod service;

pub use html::html_to_markdown;
pub use service::Bridge;
