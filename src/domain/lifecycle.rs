//! Unit-of-work port for lifecycle changes
//!
//! Every multi-record change (admission, exit, cancellation, payment,
//! refund) runs inside one `LifecycleUnit`: either all writes commit or
//! none do. Dropping a unit without calling [`LifecycleUnit::commit`]
//! rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::customer::{ContactInfo, Customer, DocumentRef, Vehicle};
use super::facility::Space;
use super::payment::{NewPayment, Payment};
use super::transaction::{NewTransaction, PaymentStatus, Transaction, TransactionStatus};
use super::DomainResult;

#[async_trait]
pub trait LifecycleStore: Send + Sync {
    async fn begin(&self) -> DomainResult<Box<dyn LifecycleUnit>>;
}

#[async_trait]
pub trait LifecycleUnit: Send + Sync {
    async fn find_space(&self, space_id: i32) -> DomainResult<Option<Space>>;

    /// AVAILABLE → OCCUPIED. `false` when the space was not available
    /// at write time.
    async fn allocate_space(&self, space_id: i32, at: DateTime<Utc>) -> DomainResult<bool>;

    /// OCCUPIED → AVAILABLE. `false` when the space was not occupied.
    async fn release_space(&self, space_id: i32, at: DateTime<Utc>) -> DomainResult<bool>;

    async fn resolve_or_create_vehicle(
        &self,
        plate: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<Vehicle>;

    /// Find by document, or create. Provided contact fields overwrite
    /// the stored ones; absent fields leave them untouched.
    async fn resolve_or_create_customer(
        &self,
        document: &DocumentRef,
        contact: &ContactInfo,
        at: DateTime<Utc>,
    ) -> DomainResult<Customer>;

    async fn active_transaction_for_vehicle(&self, vehicle_id: i32) -> DomainResult<Option<i32>>;

    async fn insert_transaction(&self, new: NewTransaction) -> DomainResult<Transaction>;

    async fn find_transaction(&self, id: i32) -> DomainResult<Option<Transaction>>;

    /// Persist `transaction` only if the stored row still has the
    /// expected statuses. `false` means another writer got there first.
    async fn save_transaction(
        &self,
        transaction: &Transaction,
        expected_status: TransactionStatus,
        expected_payment_status: PaymentStatus,
    ) -> DomainResult<bool>;

    async fn find_payment_by_transaction(
        &self,
        transaction_id: i32,
    ) -> DomainResult<Option<Payment>>;

    async fn insert_payment(&self, new: NewPayment) -> DomainResult<Payment>;

    async fn save_payment(&self, payment: &Payment) -> DomainResult<()>;

    async fn commit(self: Box<Self>) -> DomainResult<()>;
}
