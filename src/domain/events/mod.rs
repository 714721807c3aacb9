//! Domain events
//!
//! Facts published after a lifecycle change commits.
//! The EventBus implementation lives in `application::events`.

pub mod types;

pub use types::{
    Event, EventMessage, OverstayDetectedEvent, PaymentProcessedEvent, PaymentRefundedEvent,
    ReceiptDispatchedEvent, SecurityAlertEvent, TransactionCancelledEvent, VehicleEnteredEvent,
    VehicleExitedEvent,
};
