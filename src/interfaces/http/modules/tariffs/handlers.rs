//! Tariff preview handler

use std::sync::Arc;

use axum::{extract::State, Json};

use super::dto::{TariffPreviewRequest, TariffQuoteDto};
use crate::application::services::TariffResolver;
use crate::interfaces::http::common::{error_response, ApiResponse, ApiResult, ValidatedJson};

#[derive(Clone)]
pub struct TariffAppState {
    pub tariffs: Arc<TariffResolver>,
}

#[utoipa::path(
    post,
    path = "/api/v1/tariffs/preview",
    tag = "Tariffs",
    request_body = TariffPreviewRequest,
    responses(
        (status = 200, description = "Price the stay would have", body = ApiResponse<TariffQuoteDto>),
        (status = 400, description = "Tariff configuration incomplete for this stay"),
        (status = 404, description = "Parking not found"),
        (status = 422, description = "Invalid request")
    )
)]
pub async fn preview_tariff(
    State(state): State<TariffAppState>,
    ValidatedJson(req): ValidatedJson<TariffPreviewRequest>,
) -> ApiResult<TariffQuoteDto> {
    let quote = state
        .tariffs
        .quote_stay(req.parking_id, req.entry_time, req.exit_time)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(quote.into())))
}
