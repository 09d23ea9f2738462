//! Local entity projected as an ActivityPub actor.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ap_entity")]
pub struct Model {
    /// Local handle, used in `/ap/acct/{id}` URLs.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// 42-char Native address.
    #[sea_orm(unique)]
    pub ccid: String,

    /// PEM-encoded RSA public key, published in the actor document.
    pub public_key: String,

    /// PEM-encoded RSA private key. Never serialized into API responses;
    /// services return a scrubbed response type instead.
    pub private_key: String,

    /// AP `alsoKnownAs` aliases (JSON string array).
    pub also_known_as: Json,

    /// Disabled entities are skipped by outbound delivery.
    pub enabled: bool,
}

impl Model {
    /// Aliases as a plain vector.
    #[must_use]
    pub fn aliases(&self) -> Vec<String> {
        serde_json::from_value(self.also_known_as.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
