//! Domain error → HTTP status mapping

use axum::http::StatusCode;
use axum::Json;
use tracing::error;

use super::ApiResponse;
use crate::domain::DomainError;

pub type ApiError = (StatusCode, Json<ApiResponse<()>>);
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_)
        | DomainError::ZoneNotOperational { .. }
        | DomainError::TariffNotConfigured { .. }
        | DomainError::NoShiftCoverage { .. }
        | DomainError::PaymentRejected { .. } => StatusCode::BAD_REQUEST,
        DomainError::DocumentMismatch { .. } => StatusCode::FORBIDDEN,
        DomainError::Conflict(_)
        | DomainError::SpaceNotAvailable { .. }
        | DomainError::VehicleAlreadyInside { .. }
        | DomainError::InvalidTransactionState { .. }
        | DomainError::InvalidTransition(_)
        | DomainError::SpaceOccupied { .. } => StatusCode::CONFLICT,
        DomainError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert a service error into the standard error envelope.
pub fn error_response(err: DomainError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    (status, Json(ApiResponse::error(err.to_string())))
}
