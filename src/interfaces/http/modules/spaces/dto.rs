//! Space DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::facility::Space;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpaceDto {
    pub id: i32,
    pub zone_id: i32,
    pub code: String,
    /// AVAILABLE, OCCUPIED, MAINTENANCE or OUT_OF_SERVICE
    pub status: String,
    pub version: i32,
}

impl From<Space> for SpaceDto {
    fn from(s: Space) -> Self {
        Self {
            id: s.id,
            zone_id: s.zone_id,
            code: s.code,
            status: s.status.as_str().to_string(),
            version: s.version,
        }
    }
}

/// Operator toggle
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SpaceStatusRequest {
    /// AVAILABLE, MAINTENANCE or OUT_OF_SERVICE
    #[validate(length(min = 1))]
    pub status: String,
    #[validate(range(min = 1, message = "operator_id must be positive"))]
    pub operator_id: i32,
}
