//! WebSocket interfaces
//!
//! Live lifecycle events for operator dashboards and gate displays.

pub mod notifications;

pub use notifications::{stream_notifications, EventFilter, NotificationState};
