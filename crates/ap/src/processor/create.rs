//! Create activity processor.

use ccbridge_common::{AppError, AppResult};
use ccbridge_concrnt::consts;
use ccbridge_federation::RawApObj;
use ccbridge_store::entities::ap_entity;
use tracing::{info, instrument, warn};

use crate::service::ApService;

/// Processor for inbound Create activities.
pub struct CreateProcessor {
    service: ApService,
}

impl CreateProcessor {
    /// Create a new create processor.
    #[must_use]
    pub const fn new(service: ApService) -> Self {
        Self { service }
    }

    /// Import a remote Note as a Native message.
    ///
    /// The delivery set is the union of local recipients named in `to`/`cc`
    /// and local followers of the sender; each contributes their AP stream.
    #[instrument(name = "Ap.Service.Inbox.Create", skip_all)]
    pub async fn process(&self, object: &RawApObj) -> AppResult<()> {
        let service = &self.service;

        let create_object = object.get_obj("object").ok_or_else(|| {
            AppError::BadRequest("ap/service/inbox/create invalid object".to_string())
        })?;

        let create_type = create_object.must_str("type");
        if create_type != "Note" {
            warn!(object_type = %create_type, "unhandled create object");
            return Ok(());
        }

        let create_id = create_object.get_str("id").ok_or_else(|| {
            AppError::BadRequest("ap/service/inbox/create object id missing".to_string())
        })?;

        if !service.store.references.reserve(&create_id).await? {
            info!(id = %create_id, "note already imported");
            return Ok(());
        }

        let mut dest_streams: Vec<String> = Vec::new();
        let mut representative: Option<ap_entity::Model> = None;

        // local recipients named directly
        let mut recipients = create_object.get_str_list("to");
        recipients.extend(create_object.get_str_list("cc"));
        for recipient in recipients {
            let Some(local) = recipient.strip_prefix(&service.acct_prefix()) else {
                continue;
            };
            match service.store.entities.find_by_id(local).await {
                Ok(Some(entity)) => {
                    dest_streams.push(format!("{}@{}", consts::USER_AP_STREAM, entity.ccid));
                    representative.get_or_insert(entity);
                }
                _ => warn!(id = %local, "recipient entity not found"),
            }
        }

        // local followers of the sender
        let actor = object.must_str("actor");
        let follows = service
            .store
            .follows
            .find_by_publisher(&actor)
            .await
            .map_err(|e| e.context("ap/service/inbox/create GetFollowsByPublisher"))?;

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

        dest_streams.sort();
        dest_streams.dedup();

        let Some(representative) = representative else {
            info!(actor = %actor, "no local recipients for note");
            return Ok(());
        };

        let person = service
            .apclient
            .fetch_person(&actor, Some(&representative))
            .await
            .map_err(|e| e.context("ap/service/inbox/create FetchPerson"))?;

        let created = service
            .bridge
            .note_to_message(&create_object, &person, dest_streams)
            .await
            .map_err(|e| e.context("ap/service/inbox/create NoteToMessage"))?;

        service
            .store
            .references
            .update(&create_id, &created.id)
            .await
            .map_err(|e| e.context("ap/service/inbox/create UpdateApObjectReference"))?;

        Ok(())
    }
}
