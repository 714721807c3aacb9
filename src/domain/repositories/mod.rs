//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::customer::CustomerRepository;
use super::facility::FacilityRepository;
use super::payment::PaymentRepository;
use super::tariff::TariffRepository;
use super::transaction::TransactionRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let space = repos.facilities().find_space(10).await?;
///     let tx = repos.transactions().find_active_by_plate("ABC-123").await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn facilities(&self) -> &dyn FacilityRepository;
    fn tariffs(&self) -> &dyn TariffRepository;
    fn customers(&self) -> &dyn CustomerRepository;
    fn transactions(&self) -> &dyn TransactionRepository;
    fn payments(&self) -> &dyn PaymentRepository;
}
