//! Transaction DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::services::{ActiveStay, EntryCommand, ExitCommand, PaymentCommand};
use crate::domain::transaction::{
    CaptureMethod, Evidence, PaymentStatus, ReceiptChannel, Transaction, TransactionFilter,
    TransactionStatus,
};
use crate::domain::DomainError;
use crate::interfaces::http::modules::payments::PaymentDto;
use crate::interfaces::http::modules::tariffs::TariffLineDto;

// ── Requests ───────────────────────────────────────────────────

/// Vehicle admission
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EntryRequest {
    /// Licence plate; trimmed and uppercased
    #[validate(length(min = 5, max = 20))]
    pub plate: String,
    /// DNI, CE, RUC, PASSPORT, ...
    #[validate(length(min = 1, max = 20))]
    pub document_type: String,
    #[validate(length(min = 8, max = 20))]
    pub document_number: String,
    #[validate(range(min = 1))]
    pub zone_id: i32,
    #[validate(range(min = 1))]
    pub space_id: i32,
    #[validate(range(min = 1))]
    pub operator_id: i32,
    #[validate(length(max = 200))]
    pub customer_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    /// MANUAL (default), CAMERA_AI or SENSOR
    pub entry_method: Option<String>,
    #[validate(url)]
    pub photo_url: Option<String>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub plate_confidence: Option<f64>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Exit for a known transaction
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ExitRequest {
    /// Compared against the entry document as given; no format rules.
    #[validate(length(max = 64))]
    pub document_type: String,
    #[validate(length(max = 64))]
    pub document_number: String,
    #[validate(range(min = 1))]
    pub operator_id: i32,
    /// MANUAL (default), CAMERA_AI or SENSOR
    pub exit_method: Option<String>,
    #[validate(url)]
    pub photo_url: Option<String>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub plate_confidence: Option<f64>,
}

/// Exit for the vehicle's current stay
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ExitByPlateRequest {
    #[validate(length(min = 5, max = 20))]
    pub plate: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub exit: ExitRequest,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CancelRequest {
    #[validate(range(min = 1))]
    pub operator_id: i32,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PaymentRequest {
    #[validate(range(min = 1))]
    pub payment_type_id: i32,
    /// Amount offered, e.g. `"3.00"`
    pub amount: Decimal,
    #[validate(length(max = 100))]
    pub reference_number: Option<String>,
    #[validate(range(min = 1))]
    pub operator_id: i32,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    /// EMAIL and/or WHATSAPP
    #[serde(default)]
    pub receipt_channels: Vec<String>,
}

fn evidence(
    method: Option<&str>,
    photo_url: Option<String>,
    plate_confidence: Option<f64>,
) -> Result<Evidence, DomainError> {
    let method = match method.map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => CaptureMethod::from_str(&m.to_uppercase()).ok_or_else(|| {
            DomainError::Validation(format!("unknown capture method '{}'", m))
        })?,
        None => CaptureMethod::default(),
    };
    Ok(Evidence {
        method,
        photo_url,
        plate_confidence,
    })
}

impl EntryRequest {
    pub fn into_command(self) -> Result<EntryCommand, DomainError> {
        Ok(EntryCommand {
            evidence: evidence(
                self.entry_method.as_deref(),
                self.photo_url,
                self.plate_confidence,
            )?,
            plate: self.plate,
            document_type: self.document_type,
            document_number: self.document_number,
            zone_id: self.zone_id,
            space_id: self.space_id,
            operator_id: self.operator_id,
            customer_name: self.customer_name,
            email: self.email,
            phone: self.phone,
            notes: self.notes,
        })
    }
}

impl ExitRequest {
    pub fn into_command(self) -> Result<ExitCommand, DomainError> {
        Ok(ExitCommand {
            evidence: evidence(
                self.exit_method.as_deref(),
                self.photo_url,
                self.plate_confidence,
            )?,
            document_type: self.document_type,
            document_number: self.document_number,
            operator_id: self.operator_id,
        })
    }
}

impl PaymentRequest {
    pub fn into_command(self, transaction_id: i32) -> Result<PaymentCommand, DomainError> {
        let mut receipt_channels = Vec::with_capacity(self.receipt_channels.len());
        for raw in &self.receipt_channels {
            let channel = ReceiptChannel::from_str(&raw.trim().to_uppercase()).ok_or_else(|| {
                DomainError::Validation(format!("unknown receipt channel '{}'", raw))
            })?;
            if !receipt_channels.contains(&channel) {
                receipt_channels.push(channel);
            }
        }
        Ok(PaymentCommand {
            transaction_id,
            payment_type_id: self.payment_type_id,
            amount: self.amount,
            reference_number: self.reference_number,
            operator_id: self.operator_id,
            notes: self.notes,
            receipt_channels,
        })
    }
}

/// `GET /api/v1/transactions` filters
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionListQuery {
    /// ACTIVE, COMPLETED or CANCELLED
    pub status: Option<String>,
    /// UNPAID, PAID or REFUNDED
    pub payment_status: Option<String>,
    pub parking_id: Option<i32>,
    pub zone_id: Option<i32>,
    /// Substring of the plate
    pub plate: Option<String>,
    /// Entry time lower bound (inclusive)
    pub from: Option<DateTime<Utc>>,
    /// Entry time upper bound (inclusive)
    pub to: Option<DateTime<Utc>>,
}

impl TransactionListQuery {
    pub fn into_filter(self) -> Result<TransactionFilter, DomainError> {
        let status = match self.status.as_deref() {
            Some(s) => Some(TransactionStatus::from_str(&s.to_uppercase()).ok_or_else(|| {
                DomainError::Validation(format!("unknown status '{}'", s))
            })?),
            None => None,
        };
        let payment_status = match self.payment_status.as_deref() {
            Some(s) => Some(PaymentStatus::from_str(&s.to_uppercase()).ok_or_else(|| {
                DomainError::Validation(format!("unknown payment status '{}'", s))
            })?),
            None => None,
        };
        Ok(TransactionFilter {
            status,
            payment_status,
            parking_id: self.parking_id,
            zone_id: self.zone_id,
            plate: self
                .plate
                .map(|p| p.trim().to_uppercase())
                .filter(|p| !p.is_empty()),
            entry_from: self.from,
            entry_to: self.to,
        })
    }
}

// ── Responses ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReceiptDto {
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub email_status: Option<String>,
    pub whatsapp_status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionDto {
    pub id: i32,
    pub plate_number: String,
    pub vehicle_id: i32,
    pub customer_id: i32,
    pub parking_id: i32,
    pub zone_id: i32,
    pub space_id: i32,
    /// `TYPE/NUMBER`
    pub entry_document: String,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub calculated_amount: Option<Decimal>,
    pub discount_amount: Decimal,
    pub total_amount: Option<Decimal>,
    pub currency: String,
    pub rate_ids: Vec<i32>,
    pub tariff_breakdown: Vec<TariffLineDto>,
    pub status: String,
    pub payment_status: String,
    pub entry_method: String,
    pub exit_method: Option<String>,
    pub entry_operator_id: i32,
    pub exit_operator_id: Option<i32>,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<i32>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub receipt: ReceiptDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionDto {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            vehicle_id: tx.vehicle_id,
            customer_id: tx.customer_id,
            parking_id: tx.parking_id,
            zone_id: tx.zone_id,
            space_id: tx.space_id,
            entry_document: tx.entry_document.to_string(),
            entry_time: tx.entry_time,
            exit_time: tx.exit_time,
            duration_minutes: tx.duration_minutes,
            calculated_amount: tx.calculated_amount,
            discount_amount: tx.discount_amount,
            total_amount: tx.total_amount,
            currency: tx.currency,
            rate_ids: tx.rate_ids,
            tariff_breakdown: tx.tariff_lines.iter().map(TariffLineDto::from).collect(),
            status: tx.status.as_str().to_string(),
            payment_status: tx.payment_status.as_str().to_string(),
            entry_method: tx.entry_evidence.method.as_str().to_string(),
            exit_method: tx.exit_evidence.map(|e| e.method.as_str().to_string()),
            entry_operator_id: tx.entry_operator_id,
            exit_operator_id: tx.exit_operator_id,
            notes: tx.notes,
            cancellation_reason: tx.cancellation_reason,
            cancelled_by: tx.cancelled_by,
            cancelled_at: tx.cancelled_at,
            receipt: ReceiptDto {
                sent: tx.receipt.sent,
                sent_at: tx.receipt.sent_at,
                email_status: tx.receipt.email_status.map(|s| s.as_str().to_string()),
                whatsapp_status: tx.receipt.whatsapp_status.map(|s| s.as_str().to_string()),
            },
            created_at: tx.created_at,
            updated_at: tx.updated_at,
            plate_number: tx.plate_number,
        }
    }
}

/// An ACTIVE stay with live figures
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActiveStayDto {
    pub transaction: TransactionDto,
    pub elapsed_minutes: i64,
    /// Amount due if the vehicle left now; null when the tariff
    /// configuration cannot price the stay
    pub estimated_amount: Option<Decimal>,
    pub overdue: bool,
}

impl From<ActiveStay> for ActiveStayDto {
    fn from(s: ActiveStay) -> Self {
        Self {
            elapsed_minutes: s.elapsed_minutes,
            estimated_amount: s.estimated_amount,
            overdue: s.overdue,
            transaction: s.transaction.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SettledPaymentDto {
    pub payment: PaymentDto,
    pub transaction: TransactionDto,
}
