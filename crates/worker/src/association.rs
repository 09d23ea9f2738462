//! Association fan-out worker.
//!
//! A single task subscribed to every enabled entity's association stream.
//! Likes and reactions on AP-originated messages are relayed to the
//! publisher's inbox as `Like`; deleted associations are relayed as
//! `Undo{Like}`. Messages without AP meta are not bridge content and are
//! skipped.

use std::collections::HashMap;
use std::time::Duration;

use ccbridge_common::{ApConfig, AppResult};
use ccbridge_concrnt::consts;
use ccbridge_concrnt::document::{
    parse_document, Association, AssociationDocument, DocumentHead, Event, MessageDocument,
};
use ccbridge_concrnt::world::{MarkdownMessage, ReactionAssociation};
use ccbridge_concrnt::{create_token, GatewayClient, Options};
use ccbridge_federation::{ApClient, ApObject, Icon, Tag};
use ccbridge_store::Store;
use fred::clients::SubscriberClient;
use fred::interfaces::{ClientLike, EventInterface, PubsubInterface};
use fred::types::config::Config as RedisConfig;
use serde_json::json;
use tracing::{debug, error, info, warn};

/// Association relay worker.
#[derive(Clone)]
pub struct AssociationWorker {
    redis: RedisConfig,
    store: Store,
    gateway: GatewayClient,
    apclient: ApClient,
    config: ApConfig,
}

impl AssociationWorker {
    /// Create a new association worker.
    #[must_use]
    pub const fn new(
        redis: RedisConfig,
        store: Store,
        gateway: GatewayClient,
        apclient: ApClient,
        config: ApConfig,
    ) -> Self {
        Self {
            redis,
            store,
            gateway,
            apclient,
            config,
        }
    }

    /// Run the worker forever.
    pub async fn run(self) {
        let subscriber = SubscriberClient::new(self.redis.clone(), None, None, None);
        if let Err(e) = subscriber.init().await {
            error!(error = %e, "worker/association subscriber init");
            return;
        }
        info!("association worker started");

        // reconcile the subscription set against the store
        {
            let worker = self.clone();
            let subscriber = subscriber.clone();
            tokio::spawn(async move {
                // channel per entity address, resolved once
                let mut channels: HashMap<String, String> = HashMap::new();
                loop {
                    worker.reconcile(&subscriber, &mut channels).await;
                    tokio::time::sleep(Duration::from_secs(crate::RECONCILE_INTERVAL_SECS)).await;
                }
            });
        }

        let mut rx = subscriber.message_rx();
        loop {
            match rx.recv().await {
                Ok(message) => {
                    let Some(payload) = message.value.as_string() else {
                        continue;
                    };
                    if let Err(e) = self.handle_event(&payload).await {
                        warn!(error = %e, "worker/association event");
                    }
                }
                Err(e) => {
                    error!(error = %e, "worker/association receive");
                    return;
                }
            }
        }
    }

    async fn reconcile(
        &self,
        subscriber: &SubscriberClient,
        channels: &mut HashMap<String, String>,
    ) {
        let entities = match self.store.entities.find_all_enabled().await {
            Ok(entities) => entities,
            Err(e) => {
                error!(error = %e, "worker/association GetAllEntities");
                return;
            }
        };

        for entity in entities {
            if channels.contains_key(&entity.ccid) {
                continue;
            }

            let stream = format!("{}@{}", consts::USER_ASSOC_STREAM, entity.ccid);
            let record = match self
                .gateway
                .get_timeline(&stream, Some(&Options::resolver(&self.config.fqdn)))
                .await
            {
                Ok(record) => record,
                Err(e) => {
                    warn!(stream = %stream, error = %e, "worker/association GetTimeline");
                    continue;
                }
            };

            let channel = format!("{}@{}", record.id, self.config.fqdn);
            match subscriber.subscribe(channel.as_str()).await {
                Ok(()) => {
                    info!(channel = %channel, "worker/association subscribed");
                    channels.insert(entity.ccid, channel);
                }
                Err(e) => warn!(channel = %channel, error = %e, "worker/association Subscribe"),
            }
        }
    }

    async fn handle_event(&self, payload: &str) -> AppResult<()> {
        let event: Event = serde_json::from_str(payload)?;
        let head: DocumentHead = serde_json::from_str(&event.document)?;
        let association: Association = serde_json::from_value(event.resource.clone())?;

        match head.doc_type.as_str() {
            "association" => self.handle_association(&association).await,
            "delete" => self.handle_delete(&association).await,
            other => {
                debug!(doc_type = %other, "worker/association unknown document type");
                Ok(())
            }
        }
    }

    /// Target message meta, when the message is bridge content.
    async fn target_ap_meta(&self, association: &Association) -> AppResult<Option<(String, String)>> {
        let owner = self
            .gateway
            .get_entity(&association.owner, None)
            .await?;

        let token = create_token(
            &owner.domain,
            &self.config.proxy_ccid,
            &self.config.proxy_priv,
        )?;

        let message = self
            .gateway
            .get_message(
                &association.target,
                Some(&Options::resolver(&owner.domain).with_token(token)),
            )
            .await?;

        let document: MessageDocument<MarkdownMessage> = parse_document(&message.document)
            .map_err(|e| ccbridge_common::AppError::BadRequest(format!("invalid payload: {e}")))?;

        let meta = document.meta.unwrap_or_default();
        let reference = meta.get("apObjectRef").and_then(serde_json::Value::as_str);
        let inbox = meta.get("apPublisherInbox").and_then(serde_json::Value::as_str);

        Ok(match (reference, inbox) {
            (Some(reference), Some(inbox)) => Some((reference.to_string(), inbox.to_string())),
            _ => None,
        })
    }

    async fn handle_association(&self, association: &Association) -> AppResult<()> {
        // only message targets are bridged
        if !association.target.starts_with('m') {
            return Ok(());
        }

        let author = self
            .store
            .entities
            .get_by_ccid(&association.author)
            .await?;

        let Some((reference, inbox)) = self.target_ap_meta(association).await? else {
            debug!(target = %association.target, "target message is not activitypub content");
            return Ok(());
        };

        let actor = format!("https://{}/ap/acct/{}", self.config.fqdn, author.id);
        let like_id = format!("https://{}/ap/likes/{}", self.config.fqdn, association.id);

        let like = if association.schema == consts::LIKE_ASSOCIATION_SCHEMA {
            ApObject {
                context: json!(["https://www.w3.org/ns/activitystreams"]),
                object_type: "Like".to_string(),
                id: like_id,
                actor,
                content: "⭐".to_string(),
                object: json!(reference),
                ..Default::default()
            }
        } else if association.schema == consts::REACTION_ASSOCIATION_SCHEMA {
            let reaction: AssociationDocument<ReactionAssociation> =
                parse_document(&association.document).map_err(|e| {
                    ccbridge_common::AppError::BadRequest(format!("invalid reaction: {e}"))
                })?;

            let shortcode = format!(":{}:", reaction.body.shortcode.trim_matches(':'));
            ApObject {
                context: json!(["https://www.w3.org/ns/activitystreams"]),
                object_type: "Like".to_string(),
                id: like_id,
                actor,
                content: shortcode.clone(),
                tag: vec![Tag {
                    tag_type: "Emoji".to_string(),
                    id: reaction.body.image_url.clone(),
                    name: shortcode,
                    icon: Some(Icon {
                        icon_type: "Image".to_string(),
                        media_type: "image/png".to_string(),
                        url: reaction.body.image_url.clone(),
                    }),
                    ..Default::default()
                }],
                object: json!(reference),
                ..Default::default()
            }
        } else {
            return Ok(());
        };

        self.apclient
            .post_to_inbox(&inbox, &like, &author)
            .await
            .map_err(|e| e.context("worker/association PostToInbox"))
    }

    async fn handle_delete(&self, association: &Association) -> AppResult<()> {
        let author = self
            .store
            .entities
            .get_by_ccid(&association.author)
            .await?;

        let Some((reference, inbox)) = self.target_ap_meta(association).await? else {
            debug!(target = %association.target, "target message is not activitypub content");
            return Ok(());
        };

        let actor = format!("https://{}/ap/acct/{}", self.config.fqdn, author.id);
        let like_id = format!("https://{}/ap/likes/{}", self.config.fqdn, association.target);

        let undo = ApObject {
            context: json!("https://www.w3.org/ns/activitystreams"),
            object_type: "Undo".to_string(),
            actor: actor.clone(),
            id: format!("{like_id}/undo"),
            object: json!({
                "@context": "https://www.w3.org/ns/activitystreams",
                "type": "Like",
                "id": like_id,
                "actor": actor,
                "object": reference,
            }),
            ..Default::default()
        };

        self.apclient
            .post_to_inbox(&inbox, &undo, &author)
            .await
            .map_err(|e| e.context("worker/association/delete PostToInbox"))
    }
}
