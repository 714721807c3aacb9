//! Infrastructure layer - external concerns

pub mod database;

pub use database::{
    init_database, run_migrations, seed_demo_data, DatabaseConfig, SeaOrmLifecycleStore,
    SeaOrmRepositoryProvider,
};
