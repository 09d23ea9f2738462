//! Signed outbound ActivityPub HTTP client.
//!
//! Fetches remote Persons and Notes, posts activities to remote inboxes and
//! resolves `@user@host` handles over WebFinger. Fetches sign with a local
//! entity's key when one is supplied; some servers require authorized fetch.

use std::time::Duration;

use ccbridge_common::metrics::DELIVERIES_TOTAL;
use ccbridge_common::{crypto, ApConfig, AppError, AppResult};
use ccbridge_store::entities::ap_entity;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::cache::PersonCache;
use crate::objects::{ApObject, WebFinger};
use crate::raw::RawApObj;
use crate::signature::HttpSigner;

/// User agent sent on every outbound request.
pub const USER_AGENT: &str = "ccbridge/0.1 (Concrnt)";

/// The ActivityStreams public addressing sentinel.
pub const AS_PUBLIC: &str = "https://www.w3.org/ns/activitystreams#Public";

/// Outbound AP client.
#[derive(Clone)]
pub struct ApClient {
    http: Client,
    cache: PersonCache,
    config: ApConfig,
}

impl ApClient {
    /// Create a new AP client.
    #[must_use]
    pub fn new(cache: PersonCache, config: ApConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create HTTP client");

        Self {
            http,
            cache,
            config,
        }
    }

    fn key_id(&self, entity_id: &str) -> String {
        format!("https://{}/ap/acct/{entity_id}#main-key", self.config.fqdn)
    }

    fn signer(&self, entity: &ap_entity::Model) -> AppResult<HttpSigner> {
        let private_key = crypto::parse_private_key(&entity.private_key)?;
        Ok(HttpSigner::new(private_key, self.key_id(&entity.id)))
    }

    async fn signed_get(
        &self,
        target: &str,
        exec_entity: Option<&ap_entity::Model>,
    ) -> AppResult<Vec<u8>> {
        let url =
            Url::parse(target).map_err(|e| AppError::Federation(format!("invalid url: {e}")))?;

        let mut request = self
            .http
            .get(target)
            .header("Accept", "application/activity+json")
            .header("User-Agent", USER_AGENT);

        if let Some(entity) = exec_entity {
            let headers = self
                .signer(entity)?
                .sign_request("GET", &url, None)
                .map_err(|e| AppError::Federation(e.to_string()))?;
            request = request.headers(headers);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Federation(format!("GET {target}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Federation(format!(
                "GET {target}: status {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::Federation(format!("GET {target}: {e}")))?;
        Ok(body.to_vec())
    }

    /// Fetch a remote Person, consulting the cache first.
    ///
    /// `exec_entity` signs the fetch when supplied; required by servers with
    /// authorized fetch enabled.
    #[instrument(name = "ApClient.FetchPerson", skip(self, exec_entity))]
    pub async fn fetch_person(
        &self,
        actor: &str,
        exec_entity: Option<&ap_entity::Model>,
    ) -> AppResult<RawApObj> {
        if let Ok(Some(cached)) = self.cache.get(actor).await {
            if let Ok(person) = RawApObj::from_slice(cached.as_bytes()) {
                return Ok(person);
            }
        }

        let body = self.signed_get(actor, exec_entity).await?;
        let person = RawApObj::from_slice(&body)?;

        if let Ok(serialized) = serde_json::to_string(person.data()) {
            if let Err(e) = self.cache.set(actor, &serialized).await {
                warn!(actor = %actor, error = %e, "failed to cache person");
            }
        }

        Ok(person)
    }

    /// Fetch a remote Note with a signed GET.
    #[instrument(name = "ApClient.FetchNote", skip(self, exec_entity))]
    pub async fn fetch_note(
        &self,
        note_id: &str,
        exec_entity: &ap_entity::Model,
    ) -> AppResult<RawApObj> {
        let body = self.signed_get(note_id, Some(exec_entity)).await?;
        RawApObj::from_slice(&body)
    }

    /// Post an activity to a remote inbox with a signed POST.
    #[instrument(name = "ApClient.PostToInbox", skip(self, object, entity))]
    pub async fn post_to_inbox(
        &self,
        inbox: &str,
        object: &ApObject,
        entity: &ap_entity::Model,
    ) -> AppResult<()> {
        let url =
            Url::parse(inbox).map_err(|e| AppError::Federation(format!("invalid inbox: {e}")))?;

        let body =
            serde_json::to_vec(object).map_err(|e| AppError::Internal(e.to_string()))?;

        let headers = self
            .signer(entity)?
            .sign_request("POST", &url, Some(&body))
            .map_err(|e| AppError::Federation(e.to_string()))?;

        let response = self
            .http
            .post(inbox)
            .headers(headers)
            .header("Content-Type", "application/activity+json")
            .header("User-Agent", USER_AGENT)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                DELIVERIES_TOTAL.with_label_values(&["error"]).inc();
                AppError::Federation(format!("POST {inbox}: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        info!(inbox = %inbox, status = %status.as_u16(), body = %body, "posted to inbox");

        // 2xx and 3xx count as delivered
        if status.as_u16() >= 400 {
            DELIVERIES_TOTAL.with_label_values(&["error"]).inc();
            return Err(AppError::Federation(format!(
                "POST {inbox}: status {status}"
            )));
        }

        DELIVERIES_TOTAL.with_label_values(&["ok"]).inc();
        Ok(())
    }

    /// Resolve an `@user@host` handle to an actor IRI over WebFinger.
    #[instrument(name = "ApClient.ResolveActor", skip(self))]
    pub async fn resolve_actor(&self, handle: &str) -> AppResult<String> {
        let handle = handle.strip_prefix('@').unwrap_or(handle);

        let (_user, domain) = handle
            .split_once('@')
            .filter(|(user, domain)| !user.is_empty() && !domain.is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("invalid id: {handle}")))?;

        let target = format!(
            "https://{domain}/.well-known/webfinger?resource=acct:{handle}"
        );
        debug!(target = %target, "webfinger lookup");

        let response = self
            .http
            .get(&target)
            .header("Accept", "application/jrd+json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| AppError::Federation(format!("GET {target}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Federation(format!(
                "GET {target}: status {status}"
            )));
        }

        let webfinger: WebFinger = response
            .json()
            .await
            .map_err(|e| AppError::Federation(format!("GET {target}: decode: {e}")))?;

        webfinger
            .links
            .into_iter()
            .filter(|link| link.rel == "self")
            .map(|link| link.href)
            .find(|href| !href.is_empty())
            .ok_or_else(|| AppError::NotFound(format!("no ap link found for {handle}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApClient {
        let config = fred::types::config::Config::default();
        let redis = fred::clients::Client::new(config, None, None, None);
        ApClient::new(
            PersonCache::new(redis),
            ApConfig {
                fqdn: "bridge.example".to_string(),
                proxy_priv: String::new(),
                proxy_ccid: String::new(),
            },
        )
    }

    #[test]
    fn test_key_id_format() {
        assert_eq!(
            client().key_id("alice"),
            "https://bridge.example/ap/acct/alice#main-key"
        );
    }

    #[tokio::test]
    async fn test_resolve_actor_rejects_malformed_handles() {
        let client = client();
        assert!(client.resolve_actor("nodomain").await.is_err());
        assert!(client.resolve_actor("@user@").await.is_err());
        assert!(client.resolve_actor("@@host").await.is_err());
    }
}
