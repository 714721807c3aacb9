//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories, the unified RepositoryProvider and
//! the transactional lifecycle unit.

pub mod customer_repository;
pub mod facility_repository;
pub mod lifecycle_unit;
pub mod payment_repository;
pub mod repository_provider;
pub mod tariff_repository;
pub mod transaction_repository;

pub use lifecycle_unit::SeaOrmLifecycleStore;
pub use repository_provider::SeaOrmRepositoryProvider;

use crate::domain::DomainError;

pub(crate) fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Database(e.to_string())
}
