//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_facilities;
mod m20240301_000002_create_customers;
mod m20240301_000003_create_tariffs;
mod m20240301_000004_create_parking_transactions;
mod m20240301_000005_create_payments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_facilities::Migration),
            Box::new(m20240301_000002_create_customers::Migration),
            Box::new(m20240301_000003_create_tariffs::Migration),
            Box::new(m20240301_000004_create_parking_transactions::Migration),
            Box::new(m20240301_000005_create_payments::Migration),
        ]
    }
}
