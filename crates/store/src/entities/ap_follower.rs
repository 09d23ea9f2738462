//! Inbound follower: a remote AP actor subscribed to a local entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ap_follower")]
pub struct Model {
    /// Follow activity URL.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Remote actor IRI. Unique together with `publisher_user_id`.
    pub subscriber_person_url: String,

    /// Local entity id being followed.
    pub publisher_user_id: String,

    /// Remote actor's inbox, the fan-out destination.
    pub subscriber_inbox: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
