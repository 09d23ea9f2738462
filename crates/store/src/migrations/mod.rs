//! Schema migrations.

use sea_orm_migration::prelude::*;

mod m20240601_000001_create_ap_entity_table;
mod m20240601_000002_create_ap_follow_table;
mod m20240601_000003_create_ap_follower_table;
mod m20240601_000004_create_ap_object_reference_table;
mod m20240601_000005_create_ap_user_settings_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_ap_entity_table::Migration),
            Box::new(m20240601_000002_create_ap_follow_table::Migration),
            Box::new(m20240601_000003_create_ap_follower_table::Migration),
            Box::new(m20240601_000004_create_ap_object_reference_table::Migration),
            Box::new(m20240601_000005_create_ap_user_settings_table::Migration),
        ]
    }
}
