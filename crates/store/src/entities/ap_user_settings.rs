//! Per-entity settings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ap_user_settings")]
pub struct Model {
    /// Owning entity address.
    #[sea_orm(primary_key, auto_increment = false)]
    pub cc_id: String,

    /// Timelines the delivery worker listens on instead of the default home
    /// timeline (JSON string array).
    pub listen_timelines: Json,
}

impl Model {
    /// Listen timelines as a plain vector.
    #[must_use]
    pub fn timelines(&self) -> Vec<String> {
        serde_json::from_value(self.listen_timelines.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
