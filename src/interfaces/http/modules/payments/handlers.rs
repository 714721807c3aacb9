//! Payment API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::dto::{PaymentDto, RefundRequest};
use crate::application::services::PaymentProcessor;
use crate::interfaces::http::common::{error_response, ApiResponse, ApiResult, ValidatedJson};

#[derive(Clone)]
pub struct PaymentAppState {
    pub payments: Arc<PaymentProcessor>,
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/{id}/refund",
    tag = "Payments",
    params(("id" = i32, Path, description = "Payment ID")),
    request_body = RefundRequest,
    responses(
        (status = 200, description = "Payment refunded in full", body = ApiResponse<PaymentDto>),
        (status = 404, description = "Payment not found"),
        (status = 409, description = "Payment already refunded")
    )
)]
pub async fn refund_payment(
    State(state): State<PaymentAppState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<RefundRequest>,
) -> ApiResult<PaymentDto> {
    let payment = state
        .payments
        .refund(id, &req.reason, req.operator_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(payment.into())))
}
