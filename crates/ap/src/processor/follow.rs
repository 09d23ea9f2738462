//! Follow activity processor.

use ccbridge_common::{AppError, AppResult};
use ccbridge_federation::{ApObject, RawApObj};
use ccbridge_store::entities::ap_follower;
use sea_orm::ActiveValue::Set;
use serde_json::json;
use tracing::{info, instrument};

use crate::service::ApService;

/// Processor for inbound Follow activities.
pub struct FollowProcessor {
    service: ApService,
}

impl FollowProcessor {
    /// Create a new follow processor.
    #[must_use]
    pub const fn new(service: ApService) -> Self {
        Self { service }
    }

    /// Accept the follow and record the follower.
    ///
    /// Sends `Accept{Follow}` back to the requester's inbox, then inserts
    /// the follower row unless one already exists for this pair.
    #[instrument(name = "Ap.Service.Inbox.Follow", skip_all)]
    pub async fn process(&self, object: &RawApObj, inbox_id: Option<&str>) -> AppResult<()> {
        let service = &self.service;

        let local_id = match inbox_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let target = object.must_str("object");
                target
                    .strip_prefix(&service.acct_prefix())
                    .map(str::to_string)
                    .or_else(|| target.rsplit('/').next().map(str::to_string))
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| {
                        AppError::BadRequest(
                            "ap/service/inbox/follow invalid follow target".to_string(),
                        )
                    })?
            }
        };

        let entity = service
            .store
            .entities
            .get_by_id(&local_id)
            .await
            .map_err(|e| e.context("ap/service/inbox/follow GetEntityByID"))?;

        let requester = service
            .apclient
            .fetch_person(&object.must_str("actor"), Some(&entity))
            .await
            .map_err(|e| e.context("ap/service/inbox/follow FetchPerson"))?;

        let requester_id = requester.must_str("id");
        let requester_inbox = requester.must_str("inbox");

        let accept = ApObject {
            context: json!("https://www.w3.org/ns/activitystreams"),
            id: format!(
                "{}/follows/{}",
                service.acct_url(&local_id),
                url::form_urlencoded::byte_serialize(requester_id.as_bytes()).collect::<String>()
            ),
            object_type: "Accept".to_string(),
            actor: service.acct_url(&local_id),
            object: object.data().clone(),
            ..Default::default()
        };

        service
            .apclient
            .post_to_inbox(&requester_inbox, &accept, &entity)
            .await
            .map_err(|e| e.context("ap/service/inbox/follow PostToInbox"))?;

        if service
            .store
            .followers
            .find_by_pair(&local_id, &requester_id)
            .await?
            .is_some()
        {
            info!(local = %local_id, remote = %requester_id, "follow already exists");
            return Ok(());
        }

        service
            .store
            .followers
            .create(ap_follower::ActiveModel {
                id: Set(object.must_str("id")),
                subscriber_person_url: Set(requester_id.clone()),
                publisher_user_id: Set(local_id.clone()),
                subscriber_inbox: Set(requester_inbox),
            })
            .await
            .map_err(|e| e.context("ap/service/inbox/follow SaveFollower"))?;

        info!(local = %local_id, remote = %requester_id, "follower saved");
        Ok(())
    }
}
