//! Persistence layer for ccbridge.
//!
//! `SeaORM` on `PostgreSQL`:
//!
//! - **Entities**: database models in [`entities`]
//! - **Migrations**: schema migrations in [`migrations`]
//! - **Repositories**: data access in [`repositories`]

pub mod entities;
pub mod migrations;
pub mod repositories;

use std::sync::Arc;
use std::time::Duration;

use ccbridge_common::AppError;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use repositories::{
    EntityRepository, FollowRepository, FollowerRepository, ObjectReferenceRepository,
    SettingsRepository,
};

/// Initialize the database connection.
pub async fn init(dsn: &str) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(dsn);

    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600));

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Bundle of every repository, cloned freely across services.
#[derive(Clone)]
pub struct Store {
    pub entities: EntityRepository,
    pub follows: FollowRepository,
    pub followers: FollowerRepository,
    pub references: ObjectReferenceRepository,
    pub settings: SettingsRepository,
}

impl Store {
    /// Build every repository over one shared connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            entities: EntityRepository::new(Arc::clone(&db)),
            follows: FollowRepository::new(Arc::clone(&db)),
            followers: FollowerRepository::new(Arc::clone(&db)),
            references: ObjectReferenceRepository::new(Arc::clone(&db)),
            settings: SettingsRepository::new(db),
        }
    }
}
