//! Common utilities and shared types for ccbridge.

pub mod config;
pub mod crypto;
pub mod error;
pub mod metrics;

pub use config::{ApConfig, Config, NodeInfoConfig, ServerConfig};
pub use crypto::{generate_rsa_keypair, parse_private_key, parse_public_key, RsaKeypair};
pub use error::{AppError, AppResult};
