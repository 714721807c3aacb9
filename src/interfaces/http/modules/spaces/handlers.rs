//! Space API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::dto::{SpaceDto, SpaceStatusRequest};
use crate::application::services::SpaceService;
use crate::domain::{DomainError, SpaceStatus};
use crate::interfaces::http::common::{error_response, ApiResponse, ApiResult, ValidatedJson};

#[derive(Clone)]
pub struct SpaceAppState {
    pub spaces: Arc<SpaceService>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SpaceListQuery {
    pub zone_id: i32,
}

#[utoipa::path(
    get,
    path = "/api/v1/spaces",
    tag = "Spaces",
    params(SpaceListQuery),
    responses(
        (status = 200, description = "Spaces of a zone", body = ApiResponse<Vec<SpaceDto>>)
    )
)]
pub async fn list_spaces(
    State(state): State<SpaceAppState>,
    Query(q): Query<SpaceListQuery>,
) -> ApiResult<Vec<SpaceDto>> {
    let spaces = state
        .spaces
        .list_spaces(q.zone_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(
        spaces.into_iter().map(SpaceDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/spaces/{id}",
    tag = "Spaces",
    params(("id" = i32, Path, description = "Space ID")),
    responses(
        (status = 200, description = "Space details", body = ApiResponse<SpaceDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_space(
    State(state): State<SpaceAppState>,
    Path(id): Path<i32>,
) -> ApiResult<SpaceDto> {
    let space = state.spaces.get_space(id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(space.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/spaces/{id}/status",
    tag = "Spaces",
    params(("id" = i32, Path, description = "Space ID")),
    request_body = SpaceStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<SpaceDto>),
        (status = 400, description = "Unknown status"),
        (status = 409, description = "Space is occupied or the move is not allowed")
    )
)]
pub async fn set_space_status(
    State(state): State<SpaceAppState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<SpaceStatusRequest>,
) -> ApiResult<SpaceDto> {
    let target = SpaceStatus::from_str(&req.status.trim().to_uppercase())
        .ok_or_else(|| {
            DomainError::Validation(format!("unknown space status '{}'", req.status))
        })
        .map_err(error_response)?;
    let space = state
        .spaces
        .set_status(id, target, req.operator_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(space.into())))
}
