//! Outbound follow: a local entity subscribing to a remote AP actor.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ap_follow")]
pub struct Model {
    /// Follow activity URL.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Set once the remote side sends `Accept{Follow}`.
    pub accepted: bool,

    /// Remote actor IRI being followed.
    pub publisher_person_url: String,

    /// Local entity id doing the following.
    pub subscriber_user_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
