//! Shared HTTP plumbing: response envelope, error mapping, extractors

mod errors;
mod response;
mod validated_json;

pub use errors::{error_response, ApiError, ApiResult};
pub use response::{ApiResponse, PaginatedResponse, PaginationParams};
pub use validated_json::{ValidatedJson, ValidatedJsonRejection};
