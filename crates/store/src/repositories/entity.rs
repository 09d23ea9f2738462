//! Entity repository.

use std::sync::Arc;

use ccbridge_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use tracing::instrument;

use crate::entities::{ap_entity, ApEntity};

/// Entity repository for database operations.
#[derive(Clone)]
pub struct EntityRepository {
    db: Arc<DatabaseConnection>,
}

impl EntityRepository {
    /// Create a new entity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an entity by its local handle.
    #[instrument(name = "Store.GetEntityByID", skip(self))]
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<ap_entity::Model>> {
        ApEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an entity by its Native address.
    #[instrument(name = "Store.GetEntityByCCID", skip(self))]
    pub async fn find_by_ccid(&self, ccid: &str) -> AppResult<Option<ap_entity::Model>> {
        ApEntity::find()
            .filter(ap_entity::Column::Ccid.eq(ccid))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an entity by handle, erroring when absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<ap_entity::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::EntityNotFound(id.to_string()))
    }

    /// Find an entity by address, erroring when absent.
    pub async fn get_by_ccid(&self, ccid: &str) -> AppResult<ap_entity::Model> {
        self.find_by_ccid(ccid)
            .await?
            .ok_or_else(|| AppError::EntityNotFound(ccid.to_string()))
    }

    /// List all enabled entities.
    #[instrument(name = "Store.GetAllEntities", skip(self))]
    pub async fn find_all_enabled(&self) -> AppResult<Vec<ap_entity::Model>> {
        ApEntity::find()
            .filter(ap_entity::Column::Enabled.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create an entity.
    #[instrument(name = "Store.CreateEntity", skip(self, model))]
    pub async fn create(&self, model: ap_entity::ActiveModel) -> AppResult<ap_entity::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace an entity's aliases.
    #[instrument(name = "Store.UpdateEntityAliases", skip(self, aliases))]
    pub async fn update_aliases(
        &self,
        id: &str,
        aliases: &[String],
    ) -> AppResult<ap_entity::Model> {
        let entity = self.get_by_id(id).await?;

        let mut active: ap_entity::ActiveModel = entity.into();
        active.also_known_as = Set(serde_json::json!(aliases));
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
