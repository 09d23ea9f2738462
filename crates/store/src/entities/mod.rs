//! Database entities.

pub mod ap_entity;
pub mod ap_follow;
pub mod ap_follower;
pub mod ap_object_reference;
pub mod ap_user_settings;

pub use ap_entity::Entity as ApEntity;
pub use ap_follow::Entity as ApFollow;
pub use ap_follower::Entity as ApFollower;
pub use ap_object_reference::Entity as ApObjectReference;
pub use ap_user_settings::Entity as ApUserSettings;
