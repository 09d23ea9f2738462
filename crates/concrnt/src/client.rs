//! Gateway HTTP client.
//!
//! Thin client for the platform's registry and commit API. Reads resolve
//! against the local gateway unless an explicit resolver host is given
//! (reply and reroute sources may live on other domains).

use std::time::Duration;

use ccbridge_common::{AppError, AppResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::document::{
    Commit, EntityInfo, Message, ProfileRecord, ResponseBase, TimelineRecord,
};

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Host to resolve the read against instead of the local gateway.
    pub resolver: Option<String>,
    /// Bearer token for reads gated by a visibility policy.
    pub auth_token: Option<String>,
}

impl Options {
    /// Resolve against the given host.
    #[must_use]
    pub fn resolver(host: impl Into<String>) -> Self {
        Self {
            resolver: Some(host.into()),
            auth_token: None,
        }
    }

    /// Attach an auth token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Gateway client.
#[derive(Clone)]
pub struct GatewayClient {
    http: Client,
    gateway_addr: String,
}

impl GatewayClient {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(gateway_addr: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create HTTP client");

        Self {
            http,
            gateway_addr: gateway_addr.to_string(),
        }
    }

    fn base_url(&self, opts: Option<&Options>) -> String {
        let host = opts
            .and_then(|o| o.resolver.as_deref())
            .unwrap_or(&self.gateway_addr);
        if host.contains("://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{host}")
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: Option<&Options>,
    ) -> AppResult<T> {
        let url = format!("{}{path}", self.base_url(opts));
        debug!(url = %url, "gateway GET");

        let mut request = self.http.get(&url).header("Accept", "application/json");
        if let Some(token) = opts.and_then(|o| o.auth_token.as_deref()) {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("GET {url}: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(url));
        }
        if !status.is_success() {
            return Err(AppError::Gateway(format!("GET {url}: status {status}")));
        }

        let envelope: ResponseBase<T> = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("GET {url}: decode: {e}")))?;
        Ok(envelope.content)
    }

    /// Fetch a message by id.
    pub async fn get_message(&self, id: &str, opts: Option<&Options>) -> AppResult<Message> {
        self.get(&format!("/api/v1/message/{id}"), opts)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::MessageNotFound(id.to_string()),
                other => other,
            })
    }

    /// Fetch an entity registry record by address.
    pub async fn get_entity(&self, ccid: &str, opts: Option<&Options>) -> AppResult<EntityInfo> {
        self.get(&format!("/api/v1/entity/{ccid}"), opts)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::EntityNotFound(ccid.to_string()),
                other => other,
            })
    }

    /// Fetch a timeline registry record.
    ///
    /// `id` is either a bare timeline id or the `name@host` form.
    pub async fn get_timeline(
        &self,
        id: &str,
        opts: Option<&Options>,
    ) -> AppResult<TimelineRecord> {
        self.get(&format!("/api/v1/timeline/{id}"), opts).await
    }

    /// Fetch a profile document, `id` being `{owner}/{semantic id}`.
    pub async fn get_profile(&self, id: &str, opts: Option<&Options>) -> AppResult<ProfileRecord> {
        self.get(&format!("/api/v1/profile/{id}"), opts).await
    }

    /// Sign a serialized document with the proxy key and commit it.
    ///
    /// Documents minted from AP state are ephemeral; the platform keeps
    /// them out of durable archival.
    pub async fn commit_document<T: DeserializeOwned>(
        &self,
        document: &str,
        proxy_priv: &str,
        ephemeral: bool,
    ) -> AppResult<T> {
        let signature = crate::signer::sign_document(document.as_bytes(), proxy_priv)?;
        let option = serde_json::to_string(&crate::document::CommitOption {
            is_ephemeral: ephemeral,
        })
        .map_err(|e| AppError::Internal(e.to_string()))?;

        let commit = Commit {
            document: document.to_string(),
            signature,
            option,
        };
        self.commit(&commit).await
    }

    /// Submit a signed commit and decode the created resource.
    pub async fn commit<T: DeserializeOwned>(&self, commit: &Commit) -> AppResult<T> {
        let url = format!("{}/api/v1/commit", self.base_url(None));
        debug!(url = %url, "gateway commit");

        let response = self
            .http
            .post(&url)
            .json(commit)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("POST {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "POST {url}: status {status}: {body}"
            )));
        }

        let envelope: ResponseBase<T> = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("POST {url}: decode: {e}")))?;
        Ok(envelope.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_forms() {
        let client = GatewayClient::new("gateway:8080");
        assert_eq!(client.base_url(None), "https://gateway:8080");

        let client = GatewayClient::new("http://gateway:8080/");
        assert_eq!(client.base_url(None), "http://gateway:8080");

        let opts = Options::resolver("remote.example");
        assert_eq!(client.base_url(Some(&opts)), "https://remote.example");
    }
}
