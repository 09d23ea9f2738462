//! Delete activity processor.

use ccbridge_common::{AppError, AppResult};
use ccbridge_concrnt::document::DeleteDocument;
use ccbridge_federation::RawApObj;
use chrono::Utc;
use tracing::{info, instrument};

use crate::service::ApService;

/// Processor for inbound Delete activities.
pub struct DeleteProcessor {
    service: ApService,
}

impl DeleteProcessor {
    /// Create a new delete processor.
    #[must_use]
    pub const fn new(service: ApService) -> Self {
        Self { service }
    }

    /// Delete the Native counterpart of a removed remote object.
    #[instrument(name = "Ap.Service.Inbox.Delete", skip_all)]
    pub async fn process(&self, object: &RawApObj) -> AppResult<()> {
        let service = &self.service;

        let delete_object = object.get_obj("object").ok_or_else(|| {
            AppError::BadRequest("ap/service/inbox/delete invalid object".to_string())
        })?;
        let delete_id = delete_object.get_str("id").ok_or_else(|| {
            AppError::BadRequest("ap/service/inbox/delete object id missing".to_string())
        })?;

        let Some(reference) = service.store.references.find_by_ap_id(&delete_id).await? else {
            // deletes routinely arrive for objects we never imported
            info!(id = %delete_id, "no reference for deleted object");
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
            .map_err(|e| e.context("ap/service/inbox/delete Commit"))?;

        service
            .store
            .references
            .delete(&delete_id)
            .await
            .map_err(|e| e.context("ap/service/inbox/delete DeleteApObjectReference"))?;

        Ok(())
    }
}
