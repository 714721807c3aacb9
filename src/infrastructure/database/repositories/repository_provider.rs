//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::customer::CustomerRepository;
use crate::domain::facility::FacilityRepository;
use crate::domain::payment::PaymentRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::tariff::TariffRepository;
use crate::domain::transaction::TransactionRepository;

use super::customer_repository::SeaOrmCustomerRepository;
use super::facility_repository::SeaOrmFacilityRepository;
use super::payment_repository::SeaOrmPaymentRepository;
use super::tariff_repository::SeaOrmTariffRepository;
use super::transaction_repository::SeaOrmTransactionRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let space = repos.facilities().find_space(10).await?;
/// let tx = repos.transactions().find_active_by_plate("ABC-123").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    facilities: SeaOrmFacilityRepository,
    tariffs: SeaOrmTariffRepository,
    customers: SeaOrmCustomerRepository,
    transactions: SeaOrmTransactionRepository,
    payments: SeaOrmPaymentRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            facilities: SeaOrmFacilityRepository::new(db.clone()),
            tariffs: SeaOrmTariffRepository::new(db.clone()),
            customers: SeaOrmCustomerRepository::new(db.clone()),
            transactions: SeaOrmTransactionRepository::new(db.clone()),
            payments: SeaOrmPaymentRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn facilities(&self) -> &dyn FacilityRepository {
        &self.facilities
    }

    fn tariffs(&self) -> &dyn TariffRepository {
        &self.tariffs
    }

    fn customers(&self) -> &dyn CustomerRepository {
        &self.customers
    }

    fn transactions(&self) -> &dyn TransactionRepository {
        &self.transactions
    }

    fn payments(&self) -> &dyn PaymentRepository {
        &self.payments
    }
}
