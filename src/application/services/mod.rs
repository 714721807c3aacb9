//! Application services

mod overstay_monitor;
mod payment_processor;
mod receipts;
mod space_service;
mod tariff_resolver;
mod transaction_lifecycle;
mod transaction_queries;

#[cfg(test)]
mod tests;

pub use overstay_monitor::{OverstayConfig, OverstayMonitor};
pub use payment_processor::{PaymentCommand, PaymentProcessor, SettledPayment};
pub use receipts::{LoggingReceiptSender, Receipt, ReceiptDispatcher, ReceiptError, ReceiptSender};
pub use space_service::SpaceService;
pub use tariff_resolver::TariffResolver;
pub use transaction_lifecycle::{EntryCommand, ExitCommand, TransactionLifecycleManager};
pub use transaction_queries::{ActiveStay, TransactionQueries};
