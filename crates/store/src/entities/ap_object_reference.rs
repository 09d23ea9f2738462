//! Cross-reference between an AP object IRI and a Native object id.
//!
//! Rows are inserted with an empty `cc_object_id` before any inbound
//! side-effect; the primary-key conflict on that insert is what makes
//! inbound processing at-most-once. The Native id is written back once the
//! commit succeeds.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ap_object_reference")]
pub struct Model {
    /// AP object IRI.
    #[sea_orm(primary_key, auto_increment = false)]
    pub ap_object_id: String,

    /// Native object id; empty while reserved.
    pub cc_object_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
