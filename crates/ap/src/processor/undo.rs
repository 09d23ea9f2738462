//! Undo activity processor.

use ccbridge_common::{AppError, AppResult};
use ccbridge_concrnt::document::DeleteDocument;
use ccbridge_federation::RawApObj;
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::service::ApService;

/// Processor for inbound Undo activities.
pub struct UndoProcessor {
    service: ApService,
}

impl UndoProcessor {
    /// Create a new undo processor.
    #[must_use]
    pub const fn new(service: ApService) -> Self {
        Self { service }
    }

    /// Revert a previously-processed Follow or Like.
    #[instrument(name = "Ap.Service.Inbox.Undo", skip_all)]
    pub async fn process(&self, object: &RawApObj) -> AppResult<()> {
        let undo_object = object.get_obj("object").ok_or_else(|| {
            AppError::BadRequest("ap/service/inbox/undo invalid object".to_string())
        })?;

        match undo_object.must_str("type").as_str() {
            "Follow" => self.undo_follow(&undo_object).await,
            "Like" => self.undo_like(&undo_object).await,
            other => {
                warn!(object_type = %other, "unhandled undo object");
                Ok(())
            }
        }
    }

    async fn undo_follow(&self, undo_object: &RawApObj) -> AppResult<()> {
        let service = &self.service;

        let remote = undo_object.get_str("actor").ok_or_else(|| {
            AppError::BadRequest("ap/service/inbox/undo/follow actor missing".to_string())
        })?;
        let target = undo_object.get_str("object").ok_or_else(|| {
            AppError::BadRequest("ap/service/inbox/undo/follow object missing".to_string())
        })?;

        let local = target
            .strip_prefix(&service.acct_prefix())
            .unwrap_or(&target)
            .to_string();

        if service
            .store
            .followers
            .find_by_pair(&local, &remote)
            .await?
            .is_none()
        {
            info!(local = %local, remote = %remote, "follow already undone");
            return Ok(());
        }

        service
            .store
            .followers
            .remove_by_pair(&local, &remote)
            .await
            .map_err(|e| e.context("ap/service/inbox/undo/follow RemoveFollower"))?;

        info!(local = %local, remote = %remote, "follower removed");
        Ok(())
    }

    async fn undo_like(&self, undo_object: &RawApObj) -> AppResult<()> {
        let service = &self.service;

        let like_id = undo_object.get_str("id").ok_or_else(|| {
            AppError::BadRequest("ap/service/inbox/undo/like id missing".to_string())
        })?;

        let Some(reference) = service.store.references.find_by_ap_id(&like_id).await? else {
            // the like may never have reached us
            info!(id = %like_id, "no reference for undone like");
            return Ok(());
        };

        let doc = DeleteDocument {
            signer: service.config.proxy_ccid.clone(),
            doc_type: "delete".to_string(),
            signed_at: Utc::now(),
            target: reference.cc_object_id.clone(),
        };
        let document =
            serde_json::to_string(&doc).map_err(|e| AppError::Internal(e.to_string()))?;

        let _: serde_json::Value = service
            .gateway
            .commit_document(&document, &service.config.proxy_priv, true)
            .await
            .map_err(|e| e.context("ap/service/inbox/undo/like Commit"))?;

        service
            .store
            .references
            .delete(&like_id)
            .await
            .map_err(|e| e.context("ap/service/inbox/undo/like DeleteApObjectReference"))?;

        Ok(())
    }
}
