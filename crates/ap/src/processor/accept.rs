//! Accept activity processor.

use ccbridge_common::{AppError, AppResult};
use ccbridge_federation::RawApObj;
use tracing::{info, instrument, warn};

use crate::service::ApService;

/// Processor for inbound Accept activities.
pub struct AcceptProcessor {
    service: ApService,
}

impl AcceptProcessor {
    /// Create a new accept processor.
    #[must_use]
    pub const fn new(service: ApService) -> Self {
        Self { service }
    }

    /// Mark the corresponding outbound follow as accepted.
    #[instrument(name = "Ap.Service.Inbox.Accept", skip_all)]
    pub async fn process(&self, object: &RawApObj) -> AppResult<()> {
        let accept_object = object.get_obj("object").ok_or_else(|| {
            AppError::BadRequest("ap/service/inbox/accept invalid object".to_string())
        })?;

        let accept_type = accept_object.must_str("type");
        if accept_type != "Follow" {
            warn!(object_type = %accept_type, "unhandled accept object");
            return Ok(());
        }

        let follow_id = accept_object.get_str("id").ok_or_else(|| {
            AppError::BadRequest("ap/service/inbox/accept follow id missing".to_string())
        })?;

        self.service
            .store
            .follows
            .mark_accepted(&follow_id)
            .await
            .map_err(|e| e.context("ap/service/inbox/accept UpdateFollow"))?;

        info!(id = %follow_id, "follow accepted");
        Ok(())
    }
}
