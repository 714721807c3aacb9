//! Receipt delivery
//!
//! Runs after a payment commits and never affects it: each channel is
//! retried with backoff, then the outcome is recorded on the transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::events::{Event, ReceiptDispatchedEvent, SharedEventBus};
use crate::domain::payment::Payment;
use crate::domain::transaction::{ReceiptChannel, ReceiptState, ReceiptStatus, Transaction};
use crate::domain::RepositoryProvider;
use crate::shared::{retry_with_backoff, RetryPolicy};

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("customer has no {0} on file")]
    NoRecipient(&'static str),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// What gets sent to the customer
#[derive(Debug, Clone)]
pub struct Receipt {
    pub transaction_id: i32,
    pub plate_number: String,
    pub customer_name: Option<String>,
    pub recipient: String,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub amount: Decimal,
    pub currency: String,
    pub paid_at: DateTime<Utc>,
}

/// Delivery channel adapter (SMTP, messaging gateway, ...)
#[async_trait]
pub trait ReceiptSender: Send + Sync {
    async fn send(&self, channel: ReceiptChannel, receipt: &Receipt) -> Result<(), ReceiptError>;
}

/// Writes receipts to the log instead of delivering them.
pub struct LoggingReceiptSender;

#[async_trait]
impl ReceiptSender for LoggingReceiptSender {
    async fn send(&self, channel: ReceiptChannel, receipt: &Receipt) -> Result<(), ReceiptError> {
        info!(
            channel = channel.as_str(),
            transaction_id = receipt.transaction_id,
            recipient = %receipt.recipient,
            amount = %receipt.amount,
            currency = %receipt.currency,
            "Receipt sent"
        );
        Ok(())
    }
}

pub struct ReceiptDispatcher {
    repos: Arc<dyn RepositoryProvider>,
    sender: Arc<dyn ReceiptSender>,
    events: SharedEventBus,
    retry: RetryPolicy,
}

impl ReceiptDispatcher {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        sender: Arc<dyn ReceiptSender>,
        events: SharedEventBus,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repos,
            sender,
            events,
            retry,
        }
    }

    /// Deliver in the background.
    pub fn spawn(
        self: &Arc<Self>,
        transaction: Transaction,
        payment: Payment,
        channels: Vec<ReceiptChannel>,
    ) -> JoinHandle<()> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            dispatcher.dispatch(&transaction, &payment, &channels).await;
        })
    }

    /// Deliver on every channel and persist the outcome.
    pub async fn dispatch(
        &self,
        transaction: &Transaction,
        payment: &Payment,
        channels: &[ReceiptChannel],
    ) -> ReceiptState {
        let customer = match self.repos.customers().find_by_id(transaction.customer_id).await {
            Ok(customer) => customer,
            Err(e) => {
                warn!(transaction_id = transaction.id, "Receipt customer lookup failed: {}", e);
                None
            }
        };

        let mut state = transaction.receipt.clone();
        for &channel in channels {
            let recipient = customer.as_ref().and_then(|c| match channel {
                ReceiptChannel::Email => c.contact.email.clone(),
                ReceiptChannel::Whatsapp => c.contact.phone.clone(),
            });

            let outcome = match recipient {
                Some(recipient) => {
                    let receipt = Receipt {
                        transaction_id: transaction.id,
                        plate_number: transaction.plate_number.clone(),
                        customer_name: customer.as_ref().and_then(|c| c.full_name()),
                        recipient,
                        entry_time: transaction.entry_time,
                        exit_time: transaction.exit_time,
                        duration_minutes: transaction.duration_minutes,
                        amount: payment.amount,
                        currency: payment.currency.clone(),
                        paid_at: payment.paid_at,
                    };
                    retry_with_backoff(
                        &self.retry,
                        "receipt delivery",
                        || self.sender.send(channel, &receipt),
                        |e| matches!(e, ReceiptError::Delivery(_)),
                    )
                    .await
                }
                None => Err(ReceiptError::NoRecipient(match channel {
                    ReceiptChannel::Email => "email",
                    ReceiptChannel::Whatsapp => "phone",
                })),
            };

            let status = match outcome {
                Ok(()) => ReceiptStatus::Sent,
                Err(e) => {
                    warn!(
                        transaction_id = transaction.id,
                        channel = channel.as_str(),
                        "Receipt not delivered: {}",
                        e
                    );
                    ReceiptStatus::Failed
                }
            };
            let now = Utc::now();
            state.set(channel, status, now);
            self.events
                .publish(Event::ReceiptDispatched(ReceiptDispatchedEvent {
                    transaction_id: transaction.id,
                    channel: channel.as_str().to_string(),
                    status: status.as_str().to_string(),
                    timestamp: now,
                }));
        }

        if let Err(e) = self
            .repos
            .transactions()
            .update_receipt_state(transaction.id, &state)
            .await
        {
            warn!(transaction_id = transaction.id, "Failed to record receipt state: {}", e);
        }
        state
    }
}
