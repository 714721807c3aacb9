//! Payment settlement and refunds

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::info;

use super::receipts::ReceiptDispatcher;
use super::transaction_lifecycle::{changed_concurrently, invalid_state, not_found};
use crate::application::events::{
    Event, PaymentProcessedEvent, PaymentRefundedEvent, SharedEventBus,
};
use crate::domain::payment::{NewPayment, Payment, PaymentPolicy, PaymentRecordStatus, RefundDetails};
use crate::domain::transaction::{PaymentStatus, ReceiptChannel, Transaction, TransactionStatus};
use crate::domain::{DomainError, DomainResult, LifecycleStore, RepositoryProvider};

#[derive(Debug, Clone, Default)]
pub struct PaymentCommand {
    pub transaction_id: i32,
    pub payment_type_id: i32,
    pub amount: Decimal,
    pub reference_number: Option<String>,
    pub operator_id: i32,
    pub notes: Option<String>,
    pub receipt_channels: Vec<ReceiptChannel>,
}

/// Result of a committed payment
pub struct SettledPayment {
    pub payment: Payment,
    pub transaction: Transaction,
    /// Background receipt delivery, when any channel was requested
    pub receipt_dispatch: Option<JoinHandle<()>>,
}

pub struct PaymentProcessor {
    repos: Arc<dyn RepositoryProvider>,
    store: Arc<dyn LifecycleStore>,
    events: SharedEventBus,
    policy: PaymentPolicy,
    receipts: Option<Arc<ReceiptDispatcher>>,
}

impl PaymentProcessor {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        store: Arc<dyn LifecycleStore>,
        events: SharedEventBus,
        policy: PaymentPolicy,
    ) -> Self {
        Self {
            repos,
            store,
            events,
            policy,
            receipts: None,
        }
    }

    pub fn with_receipts(mut self, dispatcher: Arc<ReceiptDispatcher>) -> Self {
        self.receipts = Some(dispatcher);
        self
    }

    pub fn policy(&self) -> PaymentPolicy {
        self.policy
    }

    pub async fn process_payment(&self, cmd: PaymentCommand) -> DomainResult<SettledPayment> {
        self.process_payment_at(cmd, Utc::now()).await
    }

    pub async fn process_payment_at(
        &self,
        cmd: PaymentCommand,
        now: DateTime<Utc>,
    ) -> DomainResult<SettledPayment> {
        if cmd.amount.is_sign_negative() {
            return Err(DomainError::Validation("payment amount must not be negative".into()));
        }

        let unit = self.store.begin().await?;
        let mut tx = unit
            .find_transaction(cmd.transaction_id)
            .await?
            .ok_or_else(|| not_found("Transaction", cmd.transaction_id))?;
        if tx.status != TransactionStatus::Completed || tx.payment_status != PaymentStatus::Unpaid {
            return Err(invalid_state(&tx, "pay"));
        }

        let due = tx.total_amount.unwrap_or_default();
        if !self.policy.accepts(due, cmd.amount) {
            return Err(DomainError::PaymentRejected {
                required: format!("{} {}", due, tx.currency),
                offered: format!("{} {}", cmd.amount, tx.currency),
                policy: self.policy.as_str(),
            });
        }

        let payment = unit
            .insert_payment(NewPayment {
                transaction_id: tx.id,
                payment_type_id: cmd.payment_type_id,
                amount: cmd.amount,
                currency: tx.currency.clone(),
                reference_number: cmd.reference_number,
                operator_id: cmd.operator_id,
                paid_at: now,
                notes: cmd.notes,
            })
            .await?;

        tx.settle(now)?;
        tx.request_receipts(&cmd.receipt_channels, now);
        if !unit
            .save_transaction(&tx, TransactionStatus::Completed, PaymentStatus::Unpaid)
            .await?
        {
            return Err(changed_concurrently(tx.id));
        }
        unit.commit().await?;

        info!(
            transaction_id = tx.id,
            payment_id = payment.id,
            amount = %payment.amount,
            due = %due,
            currency = %payment.currency,
            "Payment processed"
        );
        metrics::counter!("parking_payments_total").increment(1);
        self.events
            .publish(Event::PaymentProcessed(PaymentProcessedEvent {
                transaction_id: tx.id,
                payment_id: payment.id,
                amount: payment.amount,
                currency: payment.currency.clone(),
                operator_id: payment.operator_id,
                timestamp: now,
            }));

        let receipt_dispatch = match &self.receipts {
            Some(dispatcher) if !cmd.receipt_channels.is_empty() => Some(dispatcher.spawn(
                tx.clone(),
                payment.clone(),
                cmd.receipt_channels,
            )),
            _ => None,
        };

        Ok(SettledPayment {
            payment,
            transaction: tx,
            receipt_dispatch,
        })
    }

    pub async fn refund(
        &self,
        payment_id: i32,
        reason: &str,
        operator_id: i32,
    ) -> DomainResult<Payment> {
        self.refund_at(payment_id, reason, operator_id, Utc::now())
            .await
    }

    /// Full refund: the payment and its transaction both become REFUNDED.
    pub async fn refund_at(
        &self,
        payment_id: i32,
        reason: &str,
        operator_id: i32,
        now: DateTime<Utc>,
    ) -> DomainResult<Payment> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::Validation("refund reason is required".into()));
        }

        let transaction_id = self
            .repos
            .payments()
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| not_found("Payment", payment_id))?
            .transaction_id;

        let unit = self.store.begin().await?;
        let mut payment = unit
            .find_payment_by_transaction(transaction_id)
            .await?
            .ok_or_else(|| not_found("Payment", payment_id))?;
        let mut tx = unit
            .find_transaction(transaction_id)
            .await?
            .ok_or_else(|| not_found("Transaction", transaction_id))?;

        if payment.is_refunded() || tx.payment_status != PaymentStatus::Paid {
            return Err(invalid_state(&tx, "refund"));
        }

        let status = tx.status;
        tx.refund(now)?;
        payment.status = PaymentRecordStatus::Refunded;
        payment.refund = Some(RefundDetails {
            amount: payment.amount,
            refunded_at: now,
            reason: reason.to_string(),
            refunded_by: operator_id,
        });

        unit.save_payment(&payment).await?;
        if !unit
            .save_transaction(&tx, status, PaymentStatus::Paid)
            .await?
        {
            return Err(changed_concurrently(tx.id));
        }
        unit.commit().await?;

        info!(
            transaction_id = tx.id,
            payment_id = payment.id,
            amount = %payment.amount,
            operator_id,
            "Payment refunded"
        );
        self.events.publish(Event::PaymentRefunded(PaymentRefundedEvent {
            transaction_id: tx.id,
            payment_id: payment.id,
            amount: payment.amount,
            reason: reason.to_string(),
            refunded_by: operator_id,
            timestamp: now,
        }));

        Ok(payment)
    }
}
