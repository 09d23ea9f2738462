//! Inbound follower repository.

use std::sync::Arc;

use ccbridge_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
};
use tracing::instrument;

use crate::entities::{ap_follower, ApFollower};

/// Follower repository for database operations.
#[derive(Clone)]
pub struct FollowerRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowerRepository {
    /// Create a new follower repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// List followers of a local entity.
    #[instrument(name = "Store.GetFollowers", skip(self))]
    pub async fn find_by_publisher(&self, user_id: &str) -> AppResult<Vec<ap_follower::Model>> {
        ApFollower::find()
            .filter(ap_follower::Column::PublisherUserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the follower row for a (local entity, remote actor) pair.
    #[instrument(name = "Store.GetFollowerByTuple", skip(self))]
    pub async fn find_by_pair(
        &self,
        local: &str,
        remote: &str,
    ) -> AppResult<Option<ap_follower::Model>> {
        ApFollower::find()
            .filter(ap_follower::Column::PublisherUserId.eq(local))
            .filter(ap_follower::Column::SubscriberPersonUrl.eq(remote))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Save a new follower.
    #[instrument(name = "Store.SaveFollower", skip(self, model))]
    pub async fn create(&self, model: ap_follower::ActiveModel) -> AppResult<ap_follower::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove the follower row for a pair. Idempotent.
    #[instrument(name = "Store.RemoveFollower", skip(self))]
    pub async fn remove_by_pair(&self, local: &str, remote: &str) -> AppResult<()> {
        if let Some(follower) = self.find_by_pair(local, remote).await? {
            follower
                .delete(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }
}
