//! Outbound follow repository.

use std::sync::Arc;

use ccbridge_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter,
};
use tracing::instrument;

use crate::entities::{ap_follow, ApFollow};

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a follow by its activity URL.
    #[instrument(name = "Store.GetFollowByID", skip(self))]
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<ap_follow::Model>> {
        ApFollow::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List follows initiated by a local entity.
    #[instrument(name = "Store.GetFollows", skip(self))]
    pub async fn find_by_subscriber(&self, user_id: &str) -> AppResult<Vec<ap_follow::Model>> {
        ApFollow::find()
            .filter(ap_follow::Column::SubscriberUserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List follows whose remote publisher is the given actor IRI.
    #[instrument(name = "Store.GetFollowsByPublisher", skip(self))]
    pub async fn find_by_publisher(&self, publisher: &str) -> AppResult<Vec<ap_follow::Model>> {
        ApFollow::find()
            .filter(ap_follow::Column::PublisherPersonUrl.eq(publisher))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Save a new follow.
    #[instrument(name = "Store.SaveFollow", skip(self, model))]
    pub async fn create(&self, model: ap_follow::ActiveModel) -> AppResult<ap_follow::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a follow as accepted.
    #[instrument(name = "Store.UpdateFollow", skip(self))]
    pub async fn mark_accepted(&self, id: &str) -> AppResult<ap_follow::Model> {
        let follow = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("follow {id}")))?;

        let mut active: ap_follow::ActiveModel = follow.into();
        active.accepted = Set(true);
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a follow by its activity URL, returning the removed row.
    #[instrument(name = "Store.RemoveFollow", skip(self))]
    pub async fn remove(&self, id: &str) -> AppResult<ap_follow::Model> {
        let follow = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("follow {id}")))?;

        follow
            .clone()
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(follow)
    }
}
