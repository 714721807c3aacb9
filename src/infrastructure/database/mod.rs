pub mod entities;
pub mod migrator;
pub mod repositories;
pub mod seed;

pub use repositories::{SeaOrmLifecycleStore, SeaOrmRepositoryProvider};
pub use seed::seed_demo_data;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use migrator::Migrator;

/// Connection settings for [`init_database`]
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `sqlite://./parking.db?mode=rwc`, `sqlite::memory:`, ...
    pub url: String,
}

pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let db = Database::connect(&config.url).await?;
    info!(backend = ?db.get_database_backend(), "Database connected");
    Ok(db)
}

/// Apply pending migrations
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), sea_orm::DbErr> {
    let pending = Migrator::get_pending_migrations(db).await?.len();
    Migrator::up(db, None).await?;
    info!(applied = pending, "Schema up to date");
    Ok(())
}
