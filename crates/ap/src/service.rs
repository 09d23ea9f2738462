//! ActivityPub service operations.

use std::collections::HashMap;

use ccbridge_bridge::Bridge;
use ccbridge_common::config::NodeInfoConfig;
use ccbridge_common::metrics::ACTIVITIES_RECEIVED_TOTAL;
use ccbridge_common::{ApConfig, AppError, AppResult};
use ccbridge_concrnt::consts;
use ccbridge_concrnt::document::ProfileDocument;
use ccbridge_concrnt::world::Profile;
use ccbridge_concrnt::{GatewayClient, Options};
use ccbridge_federation::{
    ApClient, ApObject, HttpVerifier, Icon, Key, NodeInfo, NodeInfoMaintainer, NodeInfoMetadata,
    NodeInfoSoftware, PersonEndpoints, RawApObj, WebFinger, WebFingerLink, WellKnown,
    WellKnownLink,
};
use ccbridge_store::Store;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::processor::{
    AcceptProcessor, AnnounceProcessor, CreateProcessor, DeleteProcessor, FollowProcessor,
    LikeProcessor, UndoProcessor,
};

/// ActivityPub service.
#[derive(Clone)]
pub struct ApService {
    pub(crate) store: Store,
    pub(crate) gateway: GatewayClient,
    pub(crate) apclient: ApClient,
    pub(crate) bridge: Bridge,
    pub(crate) node_info: NodeInfoConfig,
    pub(crate) config: ApConfig,
}

impl ApService {
    /// Create a new service.
    #[must_use]
    pub const fn new(
        store: Store,
        gateway: GatewayClient,
        apclient: ApClient,
        bridge: Bridge,
        node_info: NodeInfoConfig,
        config: ApConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            apclient,
            bridge,
            node_info,
            config,
        }
    }

    pub(crate) fn acct_url(&self, id: &str) -> String {
        format!("https://{}/ap/acct/{id}", self.config.fqdn)
    }

    pub(crate) fn acct_prefix(&self) -> String {
        format!("https://{}/ap/acct/", self.config.fqdn)
    }

    /// host-meta XRD document.
    #[instrument(name = "Ap.Service.HostMeta", skip(self))]
    pub fn host_meta(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<XRD xmlns="http://docs.oasis-open.org/ns/xri/xrd-1.0">
    <Link rel="lrdd" type="application/xrd+xml" template="https://{}/.well-known/webfinger?resource={{uri}}"/>
</XRD>"#,
            self.config.fqdn
        )
    }

    /// WebFinger lookup for a local entity.
    ///
    /// Accepts `acct:user@host` and the actor URL form.
    #[instrument(name = "Ap.Service.WebFinger", skip(self))]
    pub async fn web_finger(&self, resource: &str) -> AppResult<WebFinger> {
        let username = if let Some(acct) = resource.strip_prefix("acct:") {
            let (user, domain) = acct
                .split_once('@')
                .ok_or_else(|| AppError::BadRequest("invalid resource".to_string()))?;
            if domain != self.config.fqdn {
                return Err(AppError::NotFound("domain not found".to_string()));
            }
            user.to_string()
        } else if let Some(user) = resource.strip_prefix(&self.acct_prefix()) {
            user.to_string()
        } else {
            return Err(AppError::BadRequest("invalid resource".to_string()));
        };

        self.store.entities.get_by_id(&username).await?;

        Ok(WebFinger {
            subject: resource.to_string(),
            links: vec![WebFingerLink {
                rel: "self".to_string(),
                link_type: "application/activity+json".to_string(),
                href: self.acct_url(&username),
            }],
        })
    }

    /// NodeInfo 2.0 document.
    #[instrument(name = "Ap.Service.NodeInfo", skip(self))]
    pub fn node_info(&self) -> NodeInfo {
        NodeInfo {
            version: "2.0".to_string(),
            software: NodeInfoSoftware {
                name: "ccbridge".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            protocols: vec!["activitypub".to_string()],
            open_registrations: false,
            metadata: NodeInfoMetadata {
                node_name: self.node_info.node_name.clone(),
                node_description: self.node_info.node_description.clone(),
                maintainer: NodeInfoMaintainer {
                    name: self.node_info.maintainer_name.clone(),
                    email: self.node_info.maintainer_email.clone(),
                },
                theme_color: self.node_info.theme_color.clone(),
                proxy_ccid: self.config.proxy_ccid.clone(),
            },
        }
    }

    /// NodeInfo discovery document.
    #[instrument(name = "Ap.Service.NodeInfoWellKnown", skip(self))]
    pub fn node_info_well_known(&self) -> WellKnown {
        WellKnown {
            links: vec![WellKnownLink {
                rel: "http://nodeinfo.diaspora.software/ns/schema/2.0".to_string(),
                href: format!("https://{}/ap/nodeinfo/2.0", self.config.fqdn),
            }],
        }
    }

    /// Web profile URL a browser gets redirected to for an actor.
    #[instrument(name = "Ap.Service.GetUserWebURL", skip(self))]
    pub async fn user_web_url(&self, id: &str) -> AppResult<String> {
        let entity = self.store.entities.get_by_id(id).await?;
        Ok(format!("https://concrnt.world/{}", entity.ccid))
    }

    /// Actor document for a local entity.
    #[instrument(name = "Ap.Service.User", skip(self))]
    pub async fn user(&self, id: &str) -> AppResult<ApObject> {
        let entity = self.store.entities.get_by_id(id).await?;

        let profile = self
            .gateway
            .get_profile(
                &format!("{}/{}", entity.ccid, consts::PROFILE_SEMANTIC_ID),
                Some(&Options::resolver(&self.config.fqdn)),
            )
            .await
            .map_err(|e| e.context("ap/service/user GetProfile"))?;

        let profile: ProfileDocument<Profile> = serde_json::from_str(&profile.document)
            .map_err(|e| AppError::BadRequest(format!("invalid profile document: {e}")))?;

        let acct = self.acct_url(id);
        let shared_inbox = format!("https://{}/ap/inbox", self.config.fqdn);

        Ok(ApObject {
            context: json!([
                "https://www.w3.org/ns/activitystreams",
                "https://w3id.org/security/v1",
            ]),
            object_type: "Person".to_string(),
            id: acct.clone(),
            inbox: format!("{acct}/inbox"),
            outbox: format!("{acct}/outbox"),
            shared_inbox: shared_inbox.clone(),
            endpoints: Some(PersonEndpoints { shared_inbox }),
            preferred_username: id.to_string(),
            name: profile.body.username,
            summary: profile.body.description,
            url: acct.clone(),
            icon: Some(Icon {
                icon_type: "Image".to_string(),
                media_type: "image/png".to_string(),
                url: profile.body.avatar,
            }),
            public_key: Some(Key {
                id: format!("{acct}#main-key"),
                key_type: "Key".to_string(),
                owner: acct,
                public_key_pem: entity.public_key.clone(),
            }),
            also_known_as: entity.aliases(),
            ..Default::default()
        })
    }

    /// Web URL a browser gets redirected to for a note.
    #[instrument(name = "Ap.Service.GetNoteWebURL", skip(self))]
    pub async fn note_web_url(&self, id: &str) -> AppResult<String> {
        let message = self
            .gateway
            .get_message(id, Some(&Options::resolver(&self.config.fqdn)))
            .await?;
        Ok(format!("https://concrnt.world/{}/{id}", message.author))
    }

    /// Note document for a local message.
    #[instrument(name = "Ap.Service.Note", skip(self))]
    pub async fn note(&self, id: &str) -> AppResult<ApObject> {
        self.bridge.message_to_note(id).await
    }

    /// Verify and process one inbound activity.
    ///
    /// `headers` carries the request headers with lowercase names; `path` is
    /// the exact request path the remote signed over.
    #[instrument(name = "Ap.Service.Inbox", skip(self, object, headers))]
    pub async fn inbox(
        &self,
        object: &RawApObj,
        inbox_id: Option<&str>,
        path: &str,
        headers: &HashMap<String, String>,
    ) -> AppResult<()> {
        let signature_header = headers
            .get("signature")
            .ok_or_else(|| AppError::BadRequest("ap/service/inbox Signature not found".to_string()))?;

        let components = HttpVerifier::parse_signature_header(signature_header)
            .map_err(|e| AppError::BadRequest(format!("ap/service/inbox ParseSignature: {e}")))?;

        if components.key_id.is_empty() {
            return Err(AppError::BadRequest(
                "ap/service/inbox KeyId not found".to_string(),
            ));
        }

        // the recipient entity signs the key fetch; some remotes require
        // authorized fetch
        let recipient = match inbox_id {
            Some(id) => Some(
                self.store
                    .entities
                    .get_by_id(id)
                    .await
                    .map_err(|e| e.context("ap/service/inbox GetEntityByID"))?,
            ),
            None => None,
        };

        let requester = self
            .apclient
            .fetch_person(&components.key_id, recipient.as_ref())
            .await
            .map_err(|e| e.context("ap/service/inbox FetchPerson"))?;

        let public_key_pem = requester
            .get_obj("publicKey")
            .map(|k| k.must_str("publicKeyPem"))
            .filter(|pem| !pem.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "ap/service/inbox PublicKey not found: {}",
                    components.key_id
                ))
            })?;

        let valid = HttpVerifier::verify(&public_key_pem, &components, "POST", path, headers)
            .map_err(|e| AppError::BadRequest(format!("ap/service/inbox Verify: {e}")))?;
        if !valid {
            return Err(AppError::BadRequest(
                "ap/service/inbox signature verification failed".to_string(),
            ));
        }

        let activity_type = object.must_str("type");
        ACTIVITIES_RECEIVED_TOTAL
            .with_label_values(&[activity_type.as_str()])
            .inc();
        info!(activity_type = %activity_type, actor = %object.must_str("actor"), "received activity");

        match activity_type.as_str() {
            "Follow" => {
                FollowProcessor::new(self.clone())
                    .process(object, inbox_id)
                    .await
            }
            "Like" => LikeProcessor::new(self.clone()).process(object).await,
            "Create" => CreateProcessor::new(self.clone()).process(object).await,
            "Announce" => AnnounceProcessor::new(self.clone()).process(object).await,
            "Accept" => AcceptProcessor::new(self.clone()).process(object).await,
            "Undo" => UndoProcessor::new(self.clone()).process(object).await,
            "Delete" => DeleteProcessor::new(self.clone()).process(object).await,
            other => {
                warn!(activity_type = %other, "unhandled activity type");
                Ok(())
            }
        }
    }
}
