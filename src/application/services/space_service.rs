//! Operator-facing space management

use std::sync::Arc;

use tracing::info;

use super::transaction_lifecycle::not_found;
use crate::domain::facility::{Space, SpaceEvent, SpaceStatus};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

pub struct SpaceService {
    repos: Arc<dyn RepositoryProvider>,
}

impl SpaceService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn get_space(&self, space_id: i32) -> DomainResult<Space> {
        self.repos
            .facilities()
            .find_space(space_id)
            .await?
            .ok_or_else(|| not_found("Space", space_id))
    }

    pub async fn list_spaces(&self, zone_id: i32) -> DomainResult<Vec<Space>> {
        self.repos.facilities().list_spaces(zone_id).await
    }

    /// Toggle between AVAILABLE, MAINTENANCE and OUT_OF_SERVICE.
    /// OCCUPIED is owned by the lifecycle engine and cannot be set or left
    /// from here.
    pub async fn set_status(
        &self,
        space_id: i32,
        target: SpaceStatus,
        operator_id: i32,
    ) -> DomainResult<Space> {
        let space = self.get_space(space_id).await?;
        if space.status == SpaceStatus::Occupied {
            return Err(DomainError::SpaceOccupied { space_id });
        }
        let next = space.status.apply(SpaceEvent::Operator(target))?;

        if !self.repos.facilities().set_space_status(&space, next).await? {
            return Err(DomainError::Conflict(format!(
                "space {} changed while updating its status",
                space_id
            )));
        }

        info!(
            space_id,
            operator_id,
            from = space.status.as_str(),
            to = next.as_str(),
            "Space status changed"
        );
        self.get_space(space_id).await
    }
}
