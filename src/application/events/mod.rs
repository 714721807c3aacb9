//! Lifecycle event publication
//!
//! Payloads live in `domain::events`; this module owns delivery.

pub mod event_bus;

pub use crate::domain::events::types;
pub use crate::domain::events::types::*;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
