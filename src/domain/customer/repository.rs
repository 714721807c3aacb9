//! Customer lookup interface
//!
//! Resolve-or-create happens inside a lifecycle unit; this port only
//! serves reads (receipt delivery needs the contact details).

use async_trait::async_trait;

use super::model::Customer;
use crate::domain::DomainResult;

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Customer>>;
}
