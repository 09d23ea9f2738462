//! Per-entity settings repository.

use std::sync::Arc;

use ccbridge_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use tracing::instrument;

use crate::entities::{ap_user_settings, ApUserSettings};

/// Settings repository for database operations.
#[derive(Clone)]
pub struct SettingsRepository {
    db: Arc<DatabaseConnection>,
}

impl SettingsRepository {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find settings for an entity address.
    #[instrument(name = "Store.GetUserSettings", skip(self))]
    pub async fn find_by_ccid(&self, ccid: &str) -> AppResult<Option<ap_user_settings::Model>> {
        ApUserSettings::find_by_id(ccid)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert or replace the settings for an entity address.
    #[instrument(name = "Store.UpsertUserSettings", skip(self, listen_timelines))]
    pub async fn upsert(
        &self,
        ccid: &str,
        listen_timelines: &[String],
    ) -> AppResult<ap_user_settings::Model> {
        let value = serde_json::json!(listen_timelines);

        if let Some(existing) = self.find_by_ccid(ccid).await? {
            let mut active: ap_user_settings::ActiveModel = existing.into();
            active.listen_timelines = Set(value);
            return active
                .update(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()));
        }

        let model = ap_user_settings::ActiveModel {
            cc_id: Set(ccid.to_string()),
            listen_timelines: Set(value),
        };
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
