//! Transaction aggregate
//!
//! One vehicle's stay from admission through exit or cancellation and
//! payment. Append-only: records are transitioned, never deleted.

pub mod model;
pub mod repository;

pub use model::{
    CaptureMethod, Evidence, ExitSettlement, NewTransaction, PaymentEvent, PaymentStatus,
    ReceiptChannel, ReceiptState, ReceiptStatus, Transaction, TransactionEvent,
    TransactionStatus,
};
pub use repository::{TransactionFilter, TransactionRepository};
