//! Transaction repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{PaymentStatus, ReceiptState, Transaction, TransactionStatus};
use crate::domain::DomainResult;
use crate::shared::{PageRequest, PaginatedResult};

/// Listing filter; every field is optional and they combine with AND.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub parking_id: Option<i32>,
    pub zone_id: Option<i32>,
    /// Substring match on the normalized plate
    pub plate: Option<String>,
    pub entry_from: Option<DateTime<Utc>>,
    pub entry_to: Option<DateTime<Utc>>,
}

/// Read side of the transaction store. All state-changing writes go
/// through a [`LifecycleUnit`](crate::domain::LifecycleUnit); the only
/// exception is the receipt outcome, which never touches lifecycle state.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Transaction>>;
    async fn find_active_by_plate(&self, plate: &str) -> DomainResult<Option<Transaction>>;
    async fn list_active(&self, zone_id: Option<i32>) -> DomainResult<Vec<Transaction>>;
    async fn list(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Transaction>>;
    async fn update_receipt_state(&self, id: i32, receipt: &ReceiptState) -> DomainResult<()>;
}
