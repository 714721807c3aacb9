//! Payment record and acceptance policy

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRecordStatus {
    Completed,
    Refunded,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Refunded => "REFUNDED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "COMPLETED" => Some(Self::Completed),
            "REFUNDED" => Some(Self::Refunded),
            _ => None,
        }
    }
}

/// How an offered amount is compared with the amount due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPolicy {
    /// Offered amount must cover the total
    #[default]
    Minimum,
    /// Offered amount must equal the total
    Exact,
}

impl PaymentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimum => "minimum",
            Self::Exact => "exact",
        }
    }

    pub fn accepts(&self, due: Decimal, offered: Decimal) -> bool {
        match self {
            Self::Minimum => offered >= due,
            Self::Exact => offered == due,
        }
    }
}

/// Refund bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct RefundDetails {
    pub amount: Decimal,
    pub refunded_at: DateTime<Utc>,
    pub reason: String,
    pub refunded_by: i32,
}

/// Settlement record; at most one per transaction.
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: i32,
    pub transaction_id: i32,
    pub payment_type_id: i32,
    pub amount: Decimal,
    pub currency: String,
    pub reference_number: Option<String>,
    pub status: PaymentRecordStatus,
    pub operator_id: i32,
    pub paid_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub refund: Option<RefundDetails>,
}

impl Payment {
    pub fn is_refunded(&self) -> bool {
        self.status == PaymentRecordStatus::Refunded
    }
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub transaction_id: i32,
    pub payment_type_id: i32,
    pub amount: Decimal,
    pub currency: String,
    pub reference_number: Option<String>,
    pub operator_id: i32,
    pub paid_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_policy_accepts_overpayment() {
        let due = Decimal::new(300, 2);
        assert!(PaymentPolicy::Minimum.accepts(due, Decimal::new(300, 2)));
        assert!(PaymentPolicy::Minimum.accepts(due, Decimal::new(500, 2)));
        assert!(!PaymentPolicy::Minimum.accepts(due, Decimal::new(299, 2)));
    }

    #[test]
    fn exact_policy_requires_equality() {
        let due = Decimal::new(300, 2);
        assert!(PaymentPolicy::Exact.accepts(due, Decimal::new(3, 0)));
        assert!(!PaymentPolicy::Exact.accepts(due, Decimal::new(301, 2)));
    }

    #[test]
    fn record_status_strings() {
        assert_eq!(
            PaymentRecordStatus::from_str("REFUNDED"),
            Some(PaymentRecordStatus::Refunded)
        );
        assert_eq!(PaymentRecordStatus::Completed.as_str(), "COMPLETED");
        assert!(PaymentRecordStatus::from_str("PENDING").is_none());
    }
}
