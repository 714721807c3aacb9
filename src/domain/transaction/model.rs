//! Transaction domain entity and its state machines

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::DocumentRef;
use crate::domain::tariff::{TariffLine, TariffQuote};
use crate::shared::errors::TransitionRejected;

/// Stay status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionEvent {
    Exit,
    Cancel,
}

impl TransactionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exit => "EXIT",
            Self::Cancel => "CANCEL",
        }
    }
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(Self::Active),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// ACTIVE → COMPLETED (exit) | ACTIVE → CANCELLED (cancel). Nothing
    /// leaves COMPLETED or CANCELLED.
    pub fn apply(self, event: TransactionEvent) -> Result<Self, TransitionRejected> {
        match (self, event) {
            (Self::Active, TransactionEvent::Exit) => Ok(Self::Completed),
            (Self::Active, TransactionEvent::Cancel) => Ok(Self::Cancelled),
            (from, event) => Err(TransitionRejected::new(
                "transaction",
                from.as_str(),
                event.as_str(),
            )),
        }
    }
}

/// Settlement status, strictly forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEvent {
    Settle,
    Refund,
}

impl PaymentEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Settle => "SETTLE",
            Self::Refund => "REFUND",
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::Paid => "PAID",
            Self::Refunded => "REFUNDED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "UNPAID" => Some(Self::Unpaid),
            "PAID" => Some(Self::Paid),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }

    /// UNPAID → PAID → REFUNDED
    pub fn apply(self, event: PaymentEvent) -> Result<Self, TransitionRejected> {
        match (self, event) {
            (Self::Unpaid, PaymentEvent::Settle) => Ok(Self::Paid),
            (Self::Paid, PaymentEvent::Refund) => Ok(Self::Refunded),
            (from, event) => Err(TransitionRejected::new(
                "payment status",
                from.as_str(),
                event.as_str(),
            )),
        }
    }
}

/// How a plate / vehicle was captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaptureMethod {
    #[default]
    Manual,
    CameraAi,
    Sensor,
}

impl CaptureMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::CameraAi => "CAMERA_AI",
            Self::Sensor => "SENSOR",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "MANUAL" => Some(Self::Manual),
            "CAMERA_AI" => Some(Self::CameraAi),
            "SENSOR" => Some(Self::Sensor),
            _ => None,
        }
    }
}

/// Evidence captured at entry or exit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evidence {
    pub method: CaptureMethod,
    pub photo_url: Option<String>,
    /// Plate-recognition confidence in `[0, 1]`
    pub plate_confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptChannel {
    Email,
    Whatsapp,
}

impl ReceiptChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Whatsapp => "WHATSAPP",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "EMAIL" => Some(Self::Email),
            "WHATSAPP" => Some(Self::Whatsapp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Pending,
    Sent,
    Failed,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "SENT" => Some(Self::Sent),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Receipt dispatch outcome recorded on the transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptState {
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub email_status: Option<ReceiptStatus>,
    pub whatsapp_status: Option<ReceiptStatus>,
}

impl ReceiptState {
    pub fn status_of(&self, channel: ReceiptChannel) -> Option<ReceiptStatus> {
        match channel {
            ReceiptChannel::Email => self.email_status,
            ReceiptChannel::Whatsapp => self.whatsapp_status,
        }
    }

    pub fn set(&mut self, channel: ReceiptChannel, status: ReceiptStatus, at: DateTime<Utc>) {
        match channel {
            ReceiptChannel::Email => self.email_status = Some(status),
            ReceiptChannel::Whatsapp => self.whatsapp_status = Some(status),
        }
        if status == ReceiptStatus::Sent {
            self.sent = true;
            self.sent_at = Some(at);
        }
    }
}

/// A vehicle's stay
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i32,
    pub vehicle_id: i32,
    pub customer_id: i32,
    pub parking_id: i32,
    pub zone_id: i32,
    pub space_id: i32,
    pub plate_number: String,
    pub entry_document: DocumentRef,
    pub exit_document: Option<DocumentRef>,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub calculated_amount: Option<Decimal>,
    pub discount_amount: Decimal,
    pub total_amount: Option<Decimal>,
    pub currency: String,
    pub rate_ids: Vec<i32>,
    pub tariff_lines: Vec<TariffLine>,
    pub status: TransactionStatus,
    pub payment_status: PaymentStatus,
    pub entry_evidence: Evidence,
    pub exit_evidence: Option<Evidence>,
    pub entry_operator_id: i32,
    pub exit_operator_id: Option<i32>,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<i32>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub receipt: ReceiptState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a freshly admitted stay
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub vehicle_id: i32,
    pub customer_id: i32,
    pub parking_id: i32,
    pub zone_id: i32,
    pub space_id: i32,
    pub plate_number: String,
    pub entry_document: DocumentRef,
    pub entry_time: DateTime<Utc>,
    pub currency: String,
    pub entry_evidence: Evidence,
    pub entry_operator_id: i32,
    pub notes: Option<String>,
}

/// Everything computed at exit
#[derive(Debug, Clone)]
pub struct ExitSettlement {
    pub exit_time: DateTime<Utc>,
    pub exit_document: DocumentRef,
    pub exit_evidence: Evidence,
    pub operator_id: i32,
    pub duration_minutes: i64,
    pub quote: TariffQuote,
}

impl Transaction {
    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Exit security gate: the exit document must equal the entry one.
    pub fn verify_exit_document(&self, document: &DocumentRef) -> bool {
        self.entry_document.matches(document)
    }

    /// Minutes elapsed since entry (whole minutes, rounded up).
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        crate::domain::tariff::model::duration_minutes(self.entry_time, now)
    }

    pub fn complete(&mut self, settlement: ExitSettlement) -> Result<(), TransitionRejected> {
        self.status = self.status.apply(TransactionEvent::Exit)?;

        let calculated = settlement.quote.amount;
        // A discount never exceeds the charge, so total stays >= 0.
        let discount = self.discount_amount.min(calculated).max(Decimal::ZERO);

        self.exit_time = Some(settlement.exit_time);
        self.exit_document = Some(settlement.exit_document);
        self.exit_evidence = Some(settlement.exit_evidence);
        self.exit_operator_id = Some(settlement.operator_id);
        self.duration_minutes = Some(settlement.duration_minutes);
        self.calculated_amount = Some(calculated);
        self.discount_amount = discount;
        self.total_amount = Some(calculated - discount);
        self.currency = settlement.quote.currency.clone();
        self.rate_ids = settlement.quote.rate_ids();
        self.tariff_lines = settlement.quote.lines;
        self.updated_at = settlement.exit_time;
        Ok(())
    }

    pub fn cancel(
        &mut self,
        at: DateTime<Utc>,
        operator_id: i32,
        reason: String,
    ) -> Result<(), TransitionRejected> {
        self.status = self.status.apply(TransactionEvent::Cancel)?;
        self.exit_time = Some(at);
        self.cancelled_at = Some(at);
        self.cancelled_by = Some(operator_id);
        self.duration_minutes = Some(self.elapsed_minutes(at));
        self.calculated_amount = Some(Decimal::ZERO);
        self.discount_amount = Decimal::ZERO;
        self.total_amount = Some(Decimal::ZERO);
        self.notes = Some(match self.notes.take() {
            Some(notes) => format!("{notes}\nCancelled: {reason}"),
            None => format!("Cancelled: {reason}"),
        });
        self.cancellation_reason = Some(reason);
        self.updated_at = at;
        Ok(())
    }

    /// UNPAID → PAID. Only a completed stay can be settled.
    pub fn settle(&mut self, at: DateTime<Utc>) -> Result<(), TransitionRejected> {
        if self.status != TransactionStatus::Completed {
            return Err(TransitionRejected::new(
                "transaction",
                self.status.as_str(),
                PaymentEvent::Settle.as_str(),
            ));
        }
        self.payment_status = self.payment_status.apply(PaymentEvent::Settle)?;
        self.updated_at = at;
        Ok(())
    }

    /// PAID → REFUNDED
    pub fn refund(&mut self, at: DateTime<Utc>) -> Result<(), TransitionRejected> {
        self.payment_status = self.payment_status.apply(PaymentEvent::Refund)?;
        self.updated_at = at;
        Ok(())
    }

    /// Mark the requested receipt channels as pending delivery.
    pub fn request_receipts(&mut self, channels: &[ReceiptChannel], at: DateTime<Utc>) {
        for channel in channels {
            self.receipt.set(*channel, ReceiptStatus::Pending, at);
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tariff::RoundingPolicy;
    use chrono::TimeZone;

    fn entry_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn doc(number: &str) -> DocumentRef {
        DocumentRef::new("DNI", number).unwrap()
    }

    fn sample_tx() -> Transaction {
        Transaction {
            id: 1,
            vehicle_id: 1,
            customer_id: 1,
            parking_id: 1,
            zone_id: 1,
            space_id: 10,
            plate_number: "ABC-123".into(),
            entry_document: doc("12345678"),
            exit_document: None,
            entry_time: entry_time(),
            exit_time: None,
            duration_minutes: None,
            calculated_amount: None,
            discount_amount: Decimal::ZERO,
            total_amount: None,
            currency: "PEN".into(),
            rate_ids: vec![],
            tariff_lines: vec![],
            status: TransactionStatus::Active,
            payment_status: PaymentStatus::Unpaid,
            entry_evidence: Evidence::default(),
            exit_evidence: None,
            entry_operator_id: 7,
            exit_operator_id: None,
            notes: None,
            cancellation_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            receipt: ReceiptState::default(),
            created_at: entry_time(),
            updated_at: entry_time(),
        }
    }

    fn settlement(amount: Decimal) -> ExitSettlement {
        let exit = entry_time() + chrono::Duration::minutes(90);
        ExitSettlement {
            exit_time: exit,
            exit_document: doc("12345678"),
            exit_evidence: Evidence::default(),
            operator_id: 8,
            duration_minutes: 90,
            quote: TariffQuote {
                parking_id: 1,
                billable_minutes: 90,
                lines: vec![],
                amount,
                currency: "PEN".into(),
                rounding: RoundingPolicy::PerMinute,
            },
        }
    }

    #[test]
    fn transaction_transitions_are_exhaustive() {
        use TransactionEvent::*;
        use TransactionStatus::*;
        assert_eq!(Active.apply(Exit), Ok(Completed));
        assert_eq!(Active.apply(Cancel), Ok(Cancelled));
        for from in [Completed, Cancelled] {
            assert!(from.apply(Exit).is_err());
            assert!(from.apply(Cancel).is_err());
        }
    }

    #[test]
    fn payment_status_moves_strictly_forward() {
        use PaymentEvent::*;
        use PaymentStatus::*;
        assert_eq!(Unpaid.apply(Settle), Ok(Paid));
        assert_eq!(Paid.apply(Refund), Ok(Refunded));
        assert!(Unpaid.apply(Refund).is_err());
        assert!(Paid.apply(Settle).is_err());
        assert!(Refunded.apply(Settle).is_err());
        assert!(Refunded.apply(Refund).is_err());
    }

    #[test]
    fn status_strings_roundtrip() {
        for s in [
            TransactionStatus::Active,
            TransactionStatus::Completed,
            TransactionStatus::Cancelled,
        ] {
            assert_eq!(TransactionStatus::from_str(s.as_str()), Some(s));
        }
        for s in [PaymentStatus::Unpaid, PaymentStatus::Paid, PaymentStatus::Refunded] {
            assert_eq!(PaymentStatus::from_str(s.as_str()), Some(s));
        }
        assert_eq!(CaptureMethod::from_str("CAMERA_AI"), Some(CaptureMethod::CameraAi));
        assert!(TransactionStatus::from_str("DONE").is_none());
    }

    #[test]
    fn complete_sets_exit_fields_and_totals() {
        let mut tx = sample_tx();
        tx.complete(settlement(Decimal::new(300, 2))).unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.payment_status, PaymentStatus::Unpaid);
        assert!(tx.exit_time.is_some());
        assert_eq!(tx.duration_minutes, Some(90));
        assert_eq!(tx.calculated_amount, Some(Decimal::new(300, 2)));
        assert_eq!(tx.total_amount, Some(Decimal::new(300, 2)));
        assert_eq!(tx.exit_operator_id, Some(8));
    }

    #[test]
    fn discount_never_drives_total_negative() {
        let mut tx = sample_tx();
        tx.discount_amount = Decimal::new(500, 2);
        tx.complete(settlement(Decimal::new(300, 2))).unwrap();
        assert_eq!(tx.total_amount, Some(Decimal::ZERO));
        assert_eq!(
            tx.total_amount.unwrap(),
            tx.calculated_amount.unwrap() - tx.discount_amount
        );
    }

    #[test]
    fn second_exit_is_rejected() {
        let mut tx = sample_tx();
        tx.complete(settlement(Decimal::ONE)).unwrap();
        assert!(tx.complete(settlement(Decimal::TEN)).is_err());
        assert_eq!(tx.calculated_amount, Some(Decimal::ONE));
    }

    #[test]
    fn cancel_charges_nothing_and_sets_exit_time() {
        let mut tx = sample_tx();
        let at = entry_time() + chrono::Duration::minutes(5);
        tx.cancel(at, 9, "wrong space".into()).unwrap();
        assert_eq!(tx.status, TransactionStatus::Cancelled);
        assert_eq!(tx.exit_time, Some(at));
        assert_eq!(tx.total_amount, Some(Decimal::ZERO));
        assert_eq!(tx.cancellation_reason.as_deref(), Some("wrong space"));
        assert_eq!(tx.cancelled_by, Some(9));
        assert_eq!(tx.notes.as_deref(), Some("Cancelled: wrong space"));
        assert!(tx.exit_operator_id.is_none());
        assert!(tx.settle(at).is_err());
    }

    #[test]
    fn active_transaction_cannot_be_settled() {
        let mut tx = sample_tx();
        assert!(tx.settle(entry_time()).is_err());
        assert_eq!(tx.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn settle_then_refund() {
        let mut tx = sample_tx();
        tx.complete(settlement(Decimal::ONE)).unwrap();
        tx.settle(entry_time()).unwrap();
        assert_eq!(tx.payment_status, PaymentStatus::Paid);
        assert!(tx.settle(entry_time()).is_err());
        tx.refund(entry_time()).unwrap();
        assert_eq!(tx.payment_status, PaymentStatus::Refunded);
    }

    #[test]
    fn exit_document_gate() {
        let tx = sample_tx();
        assert!(tx.verify_exit_document(&doc("12345678")));
        assert!(!tx.verify_exit_document(&doc("00000000")));
    }

    #[test]
    fn receipt_state_records_outcomes() {
        let mut tx = sample_tx();
        tx.request_receipts(&[ReceiptChannel::Email], entry_time());
        assert_eq!(tx.receipt.email_status, Some(ReceiptStatus::Pending));
        assert!(!tx.receipt.sent);

        tx.receipt.set(ReceiptChannel::Email, ReceiptStatus::Sent, entry_time());
        assert!(tx.receipt.sent);
        assert_eq!(tx.receipt.sent_at, Some(entry_time()));
        assert_eq!(tx.receipt.status_of(ReceiptChannel::Whatsapp), None);
    }
}
