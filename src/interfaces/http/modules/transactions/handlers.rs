//! Transaction API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::dto::{
    ActiveStayDto, CancelRequest, EntryRequest, ExitByPlateRequest, ExitRequest, PaymentRequest,
    SettledPaymentDto, TransactionDto, TransactionListQuery,
};
use crate::application::services::{PaymentProcessor, TransactionLifecycleManager, TransactionQueries};
use crate::interfaces::http::common::{
    error_response, ApiError, ApiResponse, ApiResult, PaginatedResponse, PaginationParams,
    ValidatedJson,
};

/// Transaction handler state
#[derive(Clone)]
pub struct TransactionAppState {
    pub lifecycle: Arc<TransactionLifecycleManager>,
    pub payments: Arc<PaymentProcessor>,
    pub queries: Arc<TransactionQueries>,
}

// ── Commands ───────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/api/v1/transactions/entry",
    tag = "Transactions",
    request_body = EntryRequest,
    responses(
        (status = 201, description = "Vehicle admitted", body = ApiResponse<TransactionDto>),
        (status = 400, description = "Zone not operational or invalid input"),
        (status = 404, description = "Zone or space not found"),
        (status = 409, description = "Space not available or vehicle already inside"),
        (status = 422, description = "Field validation failed")
    )
)]
pub async fn register_entry(
    State(state): State<TransactionAppState>,
    ValidatedJson(req): ValidatedJson<EntryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionDto>>), ApiError> {
    let cmd = req.into_command().map_err(error_response)?;
    let tx = state
        .lifecycle
        .record_entry(cmd)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(tx.into()))))
}

#[utoipa::path(
    post,
    path = "/api/v1/transactions/{id}/exit",
    tag = "Transactions",
    params(("id" = i32, Path, description = "Transaction ID")),
    request_body = ExitRequest,
    responses(
        (status = 200, description = "Stay completed and priced", body = ApiResponse<TransactionDto>),
        (status = 400, description = "Tariff configuration incomplete"),
        (status = 403, description = "Exit document does not match the entry document"),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Transaction is not active")
    )
)]
pub async fn register_exit(
    State(state): State<TransactionAppState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<ExitRequest>,
) -> ApiResult<TransactionDto> {
    let cmd = req.into_command().map_err(error_response)?;
    let tx = state
        .lifecycle
        .record_exit(id, cmd)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(tx.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/transactions/exit",
    tag = "Transactions",
    request_body = ExitByPlateRequest,
    responses(
        (status = 200, description = "Stay completed and priced", body = ApiResponse<TransactionDto>),
        (status = 403, description = "Exit document does not match the entry document"),
        (status = 404, description = "No active stay for this plate")
    )
)]
pub async fn register_exit_by_plate(
    State(state): State<TransactionAppState>,
    ValidatedJson(req): ValidatedJson<ExitByPlateRequest>,
) -> ApiResult<TransactionDto> {
    let cmd = req.exit.into_command().map_err(error_response)?;
    let tx = state
        .lifecycle
        .record_exit_by_plate(&req.plate, cmd)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(tx.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/transactions/{id}/payment",
    tag = "Transactions",
    params(("id" = i32, Path, description = "Transaction ID")),
    request_body = PaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<SettledPaymentDto>),
        (status = 400, description = "Amount rejected by the payment policy"),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Transaction not completed or already paid")
    )
)]
pub async fn register_payment(
    State(state): State<TransactionAppState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<PaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SettledPaymentDto>>), ApiError> {
    let cmd = req.into_command(id).map_err(error_response)?;
    let settled = state
        .payments
        .process_payment(cmd)
        .await
        .map_err(error_response)?;
    if settled.receipt_dispatch.is_some() {
        info!(transaction_id = id, "Receipt delivery scheduled");
    }
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(SettledPaymentDto {
            payment: settled.payment.into(),
            transaction: settled.transaction.into(),
        })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/transactions/{id}/cancel",
    tag = "Transactions",
    params(("id" = i32, Path, description = "Transaction ID")),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Stay cancelled", body = ApiResponse<TransactionDto>),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Transaction is not active")
    )
)]
pub async fn cancel_transaction(
    State(state): State<TransactionAppState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<CancelRequest>,
) -> ApiResult<TransactionDto> {
    let tx = state
        .lifecycle
        .cancel(id, req.operator_id, &req.reason)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(tx.into())))
}

// ── Queries ────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "Transactions",
    params(TransactionListQuery, PaginationParams),
    responses(
        (status = 200, description = "Transaction history, newest entry first", body = ApiResponse<PaginatedResponse<TransactionDto>>),
        (status = 400, description = "Unknown status filter")
    )
)]
pub async fn list_transactions(
    State(state): State<TransactionAppState>,
    Query(query): Query<TransactionListQuery>,
    Query(pagination): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<TransactionDto>> {
    let filter = query.into_filter().map_err(error_response)?;
    let page = state
        .queries
        .list(&filter, pagination.into())
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(
        page,
        TransactionDto::from,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    tag = "Transactions",
    params(("id" = i32, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction details", body = ApiResponse<TransactionDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_transaction(
    State(state): State<TransactionAppState>,
    Path(id): Path<i32>,
) -> ApiResult<TransactionDto> {
    let tx = state.queries.get(id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(tx.into())))
}

/// Optional zone filter for the live views
#[derive(Debug, Default, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ZoneQuery {
    pub zone_id: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions/active",
    tag = "Transactions",
    params(ZoneQuery),
    responses(
        (status = 200, description = "Vehicles currently inside", body = ApiResponse<Vec<ActiveStayDto>>)
    )
)]
pub async fn list_active(
    State(state): State<TransactionAppState>,
    Query(q): Query<ZoneQuery>,
) -> ApiResult<Vec<ActiveStayDto>> {
    let stays = state
        .queries
        .active(q.zone_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(
        stays.into_iter().map(ActiveStayDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions/active/overdue",
    tag = "Transactions",
    params(ZoneQuery),
    responses(
        (status = 200, description = "Active stays past the recommended maximum", body = ApiResponse<Vec<ActiveStayDto>>)
    )
)]
pub async fn list_overdue(
    State(state): State<TransactionAppState>,
    Query(q): Query<ZoneQuery>,
) -> ApiResult<Vec<ActiveStayDto>> {
    let stays = state
        .queries
        .overdue(q.zone_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(
        stays.into_iter().map(ActiveStayDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions/active/plate/{plate}",
    tag = "Transactions",
    params(("plate" = String, Path, description = "Licence plate")),
    responses(
        (status = 200, description = "Current stay of the vehicle", body = ApiResponse<TransactionDto>),
        (status = 404, description = "Vehicle is not inside")
    )
)]
pub async fn get_active_by_plate(
    State(state): State<TransactionAppState>,
    Path(plate): Path<String>,
) -> ApiResult<TransactionDto> {
    match state
        .queries
        .active_by_plate(&plate)
        .await
        .map_err(error_response)?
    {
        Some(tx) => Ok(Json(ApiResponse::success(tx.into()))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!(
                "No active transaction for plate {}",
                plate.trim().to_uppercase()
            ))),
        )),
    }
}
