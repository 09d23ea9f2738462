//! Announce activity processor.

use ccbridge_common::{AppError, AppResult};
use ccbridge_concrnt::consts;
use ccbridge_concrnt::document::{Message, MessageDocument};
use ccbridge_concrnt::world::{ProfileOverride, RerouteMessage};
use ccbridge_concrnt::Options;
use ccbridge_federation::RawApObj;
use ccbridge_store::entities::ap_entity;
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::service::ApService;

/// Processor for inbound Announce activities.
pub struct AnnounceProcessor {
    service: ApService,
}

impl AnnounceProcessor {
    /// Create a new announce processor.
    #[must_use]
    pub const fn new(service: ApService) -> Self {
        Self { service }
    }

    /// Import the boosted note when needed, then mint a reroute message.
    #[instrument(name = "Ap.Service.Inbox.Announce", skip_all)]
    pub async fn process(&self, object: &RawApObj) -> AppResult<()> {
        let service = &self.service;

        let announce_object = object.get_str("object").ok_or_else(|| {
            AppError::BadRequest("ap/service/inbox/announce invalid object".to_string())
        })?;

        let activity_id = object.must_str("id");
        if !service.store.references.reserve(&activity_id).await? {
            info!(id = %activity_id, "announce already processed");
            return Ok(());
        }

        let actor = object.must_str("actor");
        let follows = service
            .store
            .follows
            .find_by_publisher(&actor)
            .await
            .map_err(|e| e.context("ap/service/inbox/announce GetFollowsByPublisher"))?;

        let mut dest_streams: Vec<String> = Vec::new();
        let mut representative: Option<ap_entity::Model> = None;
        for follow in follows {
            match service
                .store
                .entities
                .find_by_id(&follow.subscriber_user_id)
                .await
            {
                Ok(Some(entity)) => {
                    dest_streams.push(format!("{}@{}", consts::USER_AP_STREAM, entity.ccid));
                    representative.get_or_insert(entity);
                }
                _ => warn!(id = %follow.subscriber_user_id, "subscriber entity not found"),
            }
        }

        let Some(representative) = representative else {
            info!(actor = %actor, "no local followers for announce");
            return Ok(());
        };

        let person = service
            .apclient
            .fetch_person(&actor, Some(&representative))
            .await
            .map_err(|e| e.context("ap/service/inbox/announce FetchPerson"))?;

        let source_message = self
            .resolve_source(&announce_object, &representative)
            .await?;

        let mut username = person.must_str("name");
        if username.is_empty() {
            username = person.must_str("preferredUsername");
        }

        let doc = MessageDocument {
            signer: service.config.proxy_ccid.clone(),
            doc_type: "message".to_string(),
            schema: consts::REROUTE_MESSAGE_SCHEMA.to_string(),
            body: RerouteMessage {
                reroute_message_id: source_message.id,
                reroute_message_author: source_message.author,
                body: object.must_str("content"),
                profile_override: Some(ProfileOverride {
                    username,
                    avatar: person.must_str("icon.url"),
                    description: person.must_str("summary"),
                    link: actor,
                    ..Default::default()
                }),
                ..Default::default()
            },
            meta: Some(json!({
                "apActor": person.must_str("url"),
                "apObjectRef": object.must_str("id"),
                "apPublisherInbox": person.must_str("inbox"),
            })),
            signed_at: Utc::now(),
            policy: String::new(),
            policy_params: String::new(),
            timelines: dest_streams,
        };

        let document =
            serde_json::to_string(&doc).map_err(|e| AppError::Internal(e.to_string()))?;
        let created: Message = service
            .gateway
            .commit_document(&document, &service.config.proxy_priv, true)
            .await
            .map_err(|e| e.context("ap/service/inbox/announce Commit"))?;

        service
            .store
            .references
            .update(&activity_id, &created.id)
            .await
            .map_err(|e| e.context("ap/service/inbox/announce UpdateApObjectReference"))?;

        Ok(())
    }

    /// Reuse the already-imported note, or fetch and import it.
    async fn resolve_source(
        &self,
        announce_object: &str,
        representative: &ap_entity::Model,
    ) -> AppResult<Message> {
        let service = &self.service;

        if let Some(existing) = service.store.references.find_by_ap_id(announce_object).await? {
            match service
                .gateway
                .get_message(
                    &existing.cc_object_id,
                    Some(&Options::resolver(&service.config.fqdn)),
                )
                .await
            {
                Ok(message) => return Ok(message),
                Err(e) => {
                    // stale mapping, reimport below
                    warn!(id = %existing.cc_object_id, error = %e, "referenced message missing");
                    service.store.references.delete(announce_object).await?;
                }
            }
        }

        let note = service
            .apclient
            .fetch_note(announce_object, representative)
            .await
            .map_err(|e| e.context("ap/service/inbox/announce FetchNote"))?;

        let author = service
            .apclient
            .fetch_person(&note.must_str("attributedTo"), Some(representative))
            .await
            .map_err(|e| e.context("ap/service/inbox/announce FetchPerson"))?;

        let imported = service
            .bridge
            .note_to_message(
                &note,
                &author,
                vec![format!(
                    "{}@{}",
                    consts::USER_HOME_STREAM,
                    service.config.proxy_ccid
                )],
            )
            .await
            .map_err(|e| e.context("ap/service/inbox/announce NoteToMessage"))?;

        service
            .store
            .references
            .create(announce_object, &imported.id)
            .await
            .map_err(|e| e.context("ap/service/inbox/announce CreateApObjectReference"))?;

        Ok(imported)
    }
}
