//! Lifecycle events
//!
//! Defines all event types that can be broadcast to subscribers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    VehicleEntered(VehicleEnteredEvent),
    VehicleExited(VehicleExitedEvent),
    TransactionCancelled(TransactionCancelledEvent),
    PaymentProcessed(PaymentProcessedEvent),
    PaymentRefunded(PaymentRefundedEvent),
    SecurityAlert(SecurityAlertEvent),
    OverstayDetected(OverstayDetectedEvent),
    ReceiptDispatched(ReceiptDispatchedEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::VehicleEntered(_) => "vehicle_entered",
            Event::VehicleExited(_) => "vehicle_exited",
            Event::TransactionCancelled(_) => "transaction_cancelled",
            Event::PaymentProcessed(_) => "payment_processed",
            Event::PaymentRefunded(_) => "payment_refunded",
            Event::SecurityAlert(_) => "security_alert",
            Event::OverstayDetected(_) => "overstay_detected",
            Event::ReceiptDispatched(_) => "receipt_dispatched",
        }
    }

    /// Zone the event concerns, for subscriber-side filtering.
    pub fn zone_id(&self) -> Option<i32> {
        match self {
            Event::VehicleEntered(e) => Some(e.zone_id),
            Event::VehicleExited(e) => Some(e.zone_id),
            Event::TransactionCancelled(e) => Some(e.zone_id),
            Event::SecurityAlert(e) => Some(e.zone_id),
            Event::OverstayDetected(e) => Some(e.zone_id),
            Event::PaymentProcessed(_)
            | Event::PaymentRefunded(_)
            | Event::ReceiptDispatched(_) => None,
        }
    }

    pub fn transaction_id(&self) -> i32 {
        match self {
            Event::VehicleEntered(e) => e.transaction_id,
            Event::VehicleExited(e) => e.transaction_id,
            Event::TransactionCancelled(e) => e.transaction_id,
            Event::PaymentProcessed(e) => e.transaction_id,
            Event::PaymentRefunded(e) => e.transaction_id,
            Event::SecurityAlert(e) => e.transaction_id,
            Event::OverstayDetected(e) => e.transaction_id,
            Event::ReceiptDispatched(e) => e.transaction_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleEnteredEvent {
    pub transaction_id: i32,
    pub plate_number: String,
    pub parking_id: i32,
    pub zone_id: i32,
    pub space_id: i32,
    pub entry_time: DateTime<Utc>,
    pub operator_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleExitedEvent {
    pub transaction_id: i32,
    pub plate_number: String,
    pub zone_id: i32,
    pub space_id: i32,
    pub exit_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub total_amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCancelledEvent {
    pub transaction_id: i32,
    pub zone_id: i32,
    pub space_id: i32,
    pub reason: String,
    pub operator_id: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProcessedEvent {
    pub transaction_id: i32,
    pub payment_id: i32,
    pub amount: Decimal,
    pub currency: String,
    pub operator_id: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRefundedEvent {
    pub transaction_id: i32,
    pub payment_id: i32,
    pub amount: Decimal,
    pub reason: String,
    pub refunded_by: i32,
    pub timestamp: DateTime<Utc>,
}

/// Raised when an exit is attempted with the wrong document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAlertEvent {
    pub transaction_id: i32,
    pub zone_id: i32,
    pub plate_number: String,
    pub presented_document: String,
    pub operator_id: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverstayDetectedEvent {
    pub transaction_id: i32,
    pub zone_id: i32,
    pub plate_number: String,
    pub elapsed_minutes: i64,
    pub limit_minutes: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptDispatchedEvent {
    pub transaction_id: i32,
    pub channel: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Event wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_message_serializes_with_type_tag() {
        let msg = EventMessage::new(Event::TransactionCancelled(TransactionCancelledEvent {
            transaction_id: 4,
            zone_id: 2,
            space_id: 11,
            reason: "duplicate".into(),
            operator_id: 1,
            timestamp: Utc::now(),
        }));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "TransactionCancelled");
        assert_eq!(json["data"]["transaction_id"], 4);
        assert_eq!(msg.event.zone_id(), Some(2));
        assert_eq!(msg.event.event_type(), "transaction_cancelled");
    }
}
