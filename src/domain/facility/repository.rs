//! Facility registry interface

use async_trait::async_trait;

use super::model::{Parking, Space, SpaceStatus, Zone};
use crate::domain::DomainResult;

/// Read access to facility reference data plus the operator-driven
/// space toggle. Allocation and release happen only inside a
/// [`LifecycleUnit`](crate::domain::LifecycleUnit).
#[async_trait]
pub trait FacilityRepository: Send + Sync {
    async fn find_parking(&self, id: i32) -> DomainResult<Option<Parking>>;
    async fn find_zone(&self, id: i32) -> DomainResult<Option<Zone>>;
    async fn find_space(&self, id: i32) -> DomainResult<Option<Space>>;
    async fn list_spaces(&self, zone_id: i32) -> DomainResult<Vec<Space>>;

    /// Version-checked status change. Returns `false` when the space no
    /// longer has `expected` status and version.
    async fn set_space_status(
        &self,
        space: &Space,
        target: SpaceStatus,
    ) -> DomainResult<bool>;
}
