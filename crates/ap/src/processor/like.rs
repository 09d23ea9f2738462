//! Like activity processor.
//!
//! Plain likes become a `LikeAssociation`; a `tag` whose name starts with a
//! colon marks a custom emoji reaction and becomes a `ReactionAssociation`
//! with the emoji icon URL as the variant.

use ccbridge_common::{AppError, AppResult};
use ccbridge_concrnt::consts;
use ccbridge_concrnt::document::{Association, AssociationDocument};
use ccbridge_concrnt::world::{LikeAssociation, ProfileOverride, ReactionAssociation};
use ccbridge_concrnt::{create_token, Options};
use ccbridge_federation::RawApObj;
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};

use crate::service::ApService;

/// Whether a like's tag marks a custom emoji reaction.
fn is_reaction_tag(tag: Option<&RawApObj>) -> bool {
    tag.is_some_and(|t| t.must_str("name").starts_with(':'))
}

/// Processor for inbound Like activities.
pub struct LikeProcessor {
    service: ApService,
}

impl LikeProcessor {
    /// Create a new like processor.
    #[must_use]
    pub const fn new(service: ApService) -> Self {
        Self { service }
    }

    /// Mint a like or reaction association on the target message.
    #[instrument(name = "Ap.Service.Inbox.Like", skip_all)]
    pub async fn process(&self, object: &RawApObj) -> AppResult<()> {
        let service = &self.service;

        let like_object = object
            .get_str("object")
            .ok_or_else(|| AppError::BadRequest("ap/service/inbox/like invalid object".to_string()))?;

        let note_prefix = format!("https://{}/ap/note/", service.config.fqdn);
        let target_id = if let Some(local) = like_object.strip_prefix(&note_prefix) {
            local.to_string()
        } else {
            match service.store.references.find_by_ap_id(&like_object).await? {
                Some(reference) => reference.cc_object_id,
                // a like for content we never imported
                None => return Ok(()),
            }
        };

        // the target may be whisper-visible; authenticate as the proxy
        let token = create_token(
            &service.config.fqdn,
            &service.config.proxy_ccid,
            &service.config.proxy_priv,
        )
        .map_err(|e| e.context("ap/service/inbox/like CreateToken"))?;

        let target_msg = service
            .gateway
            .get_message(
                &target_id,
                Some(&Options::resolver(&service.config.fqdn).with_token(token)),
            )
            .await
            .map_err(|e| e.context("ap/service/inbox/like GetMessage"))?;

        let activity_id = object.must_str("id");
        if !service.store.references.reserve(&activity_id).await? {
            info!(id = %activity_id, "like already processed");
            return Ok(());
        }

        let entity = service
            .store
            .entities
            .get_by_ccid(&target_msg.author)
            .await
            .map_err(|e| e.context("ap/service/inbox/like GetEntityByCCID"))?;

        let person = service
            .apclient
            .fetch_person(&object.must_str("actor"), Some(&entity))
            .await
            .map_err(|e| e.context("ap/service/inbox/like FetchPerson"))?;

        let mut username = person.must_str("name");
        if username.is_empty() {
            username = person.must_str("preferredUsername");
        }

        let profile_override = Some(ProfileOverride {
            username,
            avatar: person.must_str("icon.url"),
            description: person.must_str("summary"),
            link: object.must_str("actor"),
            ..Default::default()
        });

        let meta = Some(json!({"apActor": object.must_str("actor")}));
        let timelines = vec![format!(
            "{}@{}",
            consts::USER_NOTIFY_STREAM,
            target_msg.author
        )];

        let tag = object.get_obj("tag");
        let is_reaction = is_reaction_tag(tag.as_ref());

        let document = if is_reaction {
            let tag = tag.unwrap_or_else(|| RawApObj::from_value(json!({})));
            let doc = AssociationDocument {
                signer: service.config.proxy_ccid.clone(),
                owner: target_msg.author.clone(),
                doc_type: "association".to_string(),
                schema: consts::REACTION_ASSOCIATION_SCHEMA.to_string(),
                body: ReactionAssociation {
                    shortcode: tag.must_str("name"),
                    image_url: tag.must_str("icon.url"),
                    profile_override,
                },
                meta,
                signed_at: Utc::now(),
                target: target_id,
                variant: tag.must_str("icon.url"),
                timelines,
            };
            serde_json::to_string(&doc).map_err(|e| AppError::Internal(e.to_string()))?
        } else {
            let doc = AssociationDocument {
                signer: service.config.proxy_ccid.clone(),
                owner: target_msg.author.clone(),
                doc_type: "association".to_string(),
                schema: consts::LIKE_ASSOCIATION_SCHEMA.to_string(),
                body: LikeAssociation { profile_override },
                meta,
                signed_at: Utc::now(),
                target: target_id,
                variant: String::new(),
                timelines,
            };
            serde_json::to_string(&doc).map_err(|e| AppError::Internal(e.to_string()))?
        };

        let created: Association = service
            .gateway
            .commit_document(&document, &service.config.proxy_priv, true)
            .await
            .map_err(|e| e.context("ap/service/inbox/like Commit"))?;

        service
            .store
            .references
            .update(&activity_id, &created.id)
            .await
            .map_err(|e| e.context("ap/service/inbox/like UpdateApObjectReference"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_routing_on_tag_name() {
        let reaction = RawApObj::from_value(json!({
            "tag": {"type": "Emoji", "name": ":smile:", "icon": {"url": "https://r/s.png"}}
        }));
        assert!(is_reaction_tag(reaction.get_obj("tag").as_ref()));

        // tag list form
        let listed = RawApObj::from_value(json!({
            "tag": [{"type": "Emoji", "name": ":party:", "icon": {"url": "https://r/p.png"}}]
        }));
        assert!(is_reaction_tag(listed.get_obj("tag").as_ref()));

        // absent tag is a plain like
        let plain = RawApObj::from_value(json!({"tag": null}));
        assert!(!is_reaction_tag(plain.get_obj("tag").as_ref()));

        // non-shortcode tag name is a plain like too
        let mention = RawApObj::from_value(json!({
            "tag": {"type": "Mention", "name": "@bob@remote"}
        }));
        assert!(!is_reaction_tag(mention.get_obj("tag").as_ref()));
    }
}
