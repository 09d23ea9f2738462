//! Cross-reference repository.
//!
//! The reserve-then-update protocol lives here: `reserve` inserts a row with
//! an empty Native id and reports whether this caller won; the primary-key
//! conflict is the synchronization primitive, no lock needed.

use std::sync::Arc;

use ccbridge_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    SqlErr,
};
use tracing::instrument;

use crate::entities::{ap_object_reference, ApObjectReference};

/// Cross-reference repository for database operations.
#[derive(Clone)]
pub struct ObjectReferenceRepository {
    db: Arc<DatabaseConnection>,
}

impl ObjectReferenceRepository {
    /// Create a new cross-reference repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a reference by the AP object IRI.
    #[instrument(name = "Store.GetApObjectReferenceByApObjectID", skip(self))]
    pub async fn find_by_ap_id(
        &self,
        ap_object_id: &str,
    ) -> AppResult<Option<ap_object_reference::Model>> {
        ApObjectReference::find_by_id(ap_object_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a reference by the Native object id.
    #[instrument(name = "Store.GetApObjectReferenceByCcObjectID", skip(self))]
    pub async fn find_by_cc_id(
        &self,
        cc_object_id: &str,
    ) -> AppResult<Option<ap_object_reference::Model>> {
        ApObjectReference::find()
            .filter(ap_object_reference::Column::CcObjectId.eq(cc_object_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reserve an AP object id for processing.
    ///
    /// Returns `Ok(true)` when this caller inserted the row and owns the
    /// processing, `Ok(false)` when another caller already reserved it.
    #[instrument(name = "Store.CreateApObjectReference", skip(self))]
    pub async fn reserve(&self, ap_object_id: &str) -> AppResult<bool> {
        let model = ap_object_reference::ActiveModel {
            ap_object_id: Set(ap_object_id.to_string()),
            cc_object_id: Set(String::new()),
        };

        match model.insert(self.db.as_ref()).await {
            Ok(_) => Ok(true),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(false),
                _ => Err(AppError::Database(e.to_string())),
            },
        }
    }

    /// Insert a fully-resolved reference (import path).
    #[instrument(name = "Store.CreateApObjectReferenceResolved", skip(self))]
    pub async fn create(&self, ap_object_id: &str, cc_object_id: &str) -> AppResult<()> {
        let model = ap_object_reference::ActiveModel {
            ap_object_id: Set(ap_object_id.to_string()),
            cc_object_id: Set(cc_object_id.to_string()),
        };
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Write the Native object id back onto a reservation.
    #[instrument(name = "Store.UpdateApObjectReference", skip(self))]
    pub async fn update(&self, ap_object_id: &str, cc_object_id: &str) -> AppResult<()> {
        let reference = self
            .find_by_ap_id(ap_object_id)
            .await?
            .ok_or_else(|| AppError::ReferenceNotFound(ap_object_id.to_string()))?;

        let mut active: ap_object_reference::ActiveModel = reference.into();
        active.cc_object_id = Set(cc_object_id.to_string());
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a reference by the AP object IRI.
    #[instrument(name = "Store.DeleteApObjectReference", skip(self))]
    pub async fn delete(&self, ap_object_id: &str) -> AppResult<()> {
        ApObjectReference::delete_by_id(ap_object_id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
