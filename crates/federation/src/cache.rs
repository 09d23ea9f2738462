//! Remote Person caching.
//!
//! Remote actor documents are fetched on every signature verification and
//! every mention resolution, so they are cached in Redis for 30 minutes.
//! Entries are raw JSON bytes; last-writer-wins is fine, expired entries are
//! simply refetched.

use ccbridge_common::metrics::PERSON_CACHE_TOTAL;
use ccbridge_common::{AppError, AppResult};
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use tracing::debug;

/// Cache TTL: 30 minutes.
const PERSON_CACHE_TTL_SECS: i64 = 30 * 60;

const KEY_PREFIX: &str = "ccbridge:person:";

/// Redis-backed cache of remote actor documents.
#[derive(Clone)]
pub struct PersonCache {
    client: RedisClient,
}

impl PersonCache {
    /// Create a cache over an initialized Redis client.
    #[must_use]
    pub const fn new(client: RedisClient) -> Self {
        Self { client }
    }

    fn key(actor: &str) -> String {
        format!("{KEY_PREFIX}{actor}")
    }

    /// Look up the cached document for an actor IRI.
    pub async fn get(&self, actor: &str) -> AppResult<Option<String>> {
        let cached: Option<String> = self
            .client
            .get(Self::key(actor))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        if cached.is_some() {
            PERSON_CACHE_TOTAL.with_label_values(&["hit"]).inc();
            debug!(actor = %actor, "person cache hit");
        } else {
            PERSON_CACHE_TOTAL.with_label_values(&["miss"]).inc();
        }

        Ok(cached)
    }

    /// Store the document for an actor IRI with the standard TTL.
    pub async fn set(&self, actor: &str, document: &str) -> AppResult<()> {
        let _: () = self
            .client
            .set(
                Self::key(actor),
                document,
                Some(Expiration::EX(PERSON_CACHE_TTL_SECS)),
                None,
                false,
            )
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_namespacing() {
        assert_eq!(
            PersonCache::key("https://remote/users/bob"),
            "ccbridge:person:https://remote/users/bob"
        );
    }
}
