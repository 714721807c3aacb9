//! Payment DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::payment::Payment;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefundRequest {
    #[validate(range(min = 1, message = "operator_id must be positive"))]
    pub operator_id: i32,
    #[validate(length(min = 1, max = 500, message = "reason is required"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefundDto {
    pub amount: Decimal,
    pub refunded_at: DateTime<Utc>,
    pub reason: String,
    pub refunded_by: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentDto {
    pub id: i32,
    pub transaction_id: i32,
    pub payment_type_id: i32,
    pub amount: Decimal,
    pub currency: String,
    pub reference_number: Option<String>,
    /// COMPLETED or REFUNDED
    pub status: String,
    pub operator_id: i32,
    pub paid_at: DateTime<Utc>,
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund: Option<RefundDto>,
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            transaction_id: p.transaction_id,
            payment_type_id: p.payment_type_id,
            amount: p.amount,
            status: p.status.as_str().to_string(),
            currency: p.currency,
            reference_number: p.reference_number,
            operator_id: p.operator_id,
            paid_at: p.paid_at,
            notes: p.notes,
            refund: p.refund.map(|r| RefundDto {
                amount: r.amount,
                refunded_at: r.refunded_at,
                reason: r.reason,
                refunded_by: r.refunded_by,
            }),
        }
    }
}
