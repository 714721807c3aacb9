//! Tariff configuration lookup interface

use async_trait::async_trait;

use super::model::{AssignedRate, Shift};
use crate::domain::DomainResult;

#[async_trait]
pub trait TariffRepository: Send + Sync {
    /// Active shifts applicable to a parking: global shifts plus the
    /// parking's own.
    async fn list_shifts(&self, parking_id: i32) -> DomainResult<Vec<Shift>>;

    /// Active assignment for `(parking_id, shift_id)` joined with its
    /// rate. `None` when unassigned, inactive or the rate is inactive.
    async fn shift_rate_assignment(
        &self,
        parking_id: i32,
        shift_id: i32,
    ) -> DomainResult<Option<AssignedRate>>;
}
