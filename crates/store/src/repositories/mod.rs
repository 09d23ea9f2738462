//! Data access repositories.

pub mod entity;
pub mod follow;
pub mod follower;
pub mod object_reference;
pub mod settings;

pub use entity::EntityRepository;
pub use follow::FollowRepository;
pub use follower::FollowerRepository;
pub use object_reference::ObjectReferenceRepository;
pub use settings::SettingsRepository;
