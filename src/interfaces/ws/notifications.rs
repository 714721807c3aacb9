//! Lifecycle event stream
//!
//! `GET /api/v1/notifications/ws?zone_id=3&event_types=vehicle_entered,security_alert`
//! upgrades to a WebSocket that forwards every matching bus event as JSON.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::select;
use tracing::{debug, info, warn};

use crate::application::events::{EventMessage, SharedEventBus};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct EventFilter {
    /// Only events about this zone. Payment and receipt events carry no
    /// zone and are dropped when this is set.
    pub zone_id: Option<i32>,
    /// Comma-separated event type names
    pub event_types: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, message: &EventMessage) -> bool {
        if let Some(zone) = self.zone_id {
            if message.event.zone_id() != Some(zone) {
                return false;
            }
        }
        match self.event_types.as_deref() {
            Some(types) => types
                .split(',')
                .map(str::trim)
                .any(|t| t == message.event.event_type()),
            None => true,
        }
    }
}

#[derive(Clone)]
pub struct NotificationState {
    pub event_bus: SharedEventBus,
}

pub async fn stream_notifications(
    ws: WebSocketUpgrade,
    State(state): State<NotificationState>,
    Query(filter): Query<EventFilter>,
) -> impl IntoResponse {
    info!(zone_id = ?filter.zone_id, event_types = ?filter.event_types, "Notification client connecting");
    ws.on_upgrade(move |socket| forward_events(socket, state, filter))
}

async fn forward_events(socket: WebSocket, state: NotificationState, filter: EventFilter) {
    let (mut sink, mut inbound) = socket.split();
    let mut subscriber = state.event_bus.subscribe();

    let hello = serde_json::json!({
        "type": "connected",
        "filter": { "zone_id": filter.zone_id, "event_types": filter.event_types },
    });
    if sink.send(Message::Text(hello.to_string().into())).await.is_err() {
        return;
    }

    loop {
        select! {
            incoming = inbound.next() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    warn!(error = %e, "Notification socket error");
                    break;
                }
                Some(Ok(_)) => {}
            },
            event = subscriber.recv() => {
                let Some(message) = event else {
                    warn!("Event bus closed");
                    break;
                };
                if !filter.matches(&message) {
                    continue;
                }
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "Cannot serialize event");
                        continue;
                    }
                };
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
                debug!(event_type = message.event.event_type(), "Event forwarded");
            }
        }
    }

    info!("Notification client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::{Event, PaymentProcessedEvent, SecurityAlertEvent};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn alert(zone_id: i32) -> EventMessage {
        EventMessage::new(Event::SecurityAlert(SecurityAlertEvent {
            transaction_id: 1,
            zone_id,
            plate_number: "ABC-123".into(),
            presented_document: "DNI/87654321".into(),
            operator_id: 1,
            timestamp: Utc::now(),
        }))
    }

    fn payment() -> EventMessage {
        EventMessage::new(Event::PaymentProcessed(PaymentProcessedEvent {
            transaction_id: 1,
            payment_id: 1,
            amount: Decimal::new(300, 2),
            currency: "PEN".into(),
            operator_id: 1,
            timestamp: Utc::now(),
        }))
    }

    #[test]
    fn empty_filter_passes_everything() {
        let filter = EventFilter::default();
        assert!(filter.matches(&alert(1)));
        assert!(filter.matches(&payment()));
    }

    #[test]
    fn zone_filter_drops_other_zones_and_zoneless_events() {
        let filter = EventFilter {
            zone_id: Some(1),
            event_types: None,
        };
        assert!(filter.matches(&alert(1)));
        assert!(!filter.matches(&alert(2)));
        assert!(!filter.matches(&payment()));
    }

    #[test]
    fn type_filter_accepts_listed_types() {
        let filter = EventFilter {
            zone_id: None,
            event_types: Some("vehicle_entered, security_alert".into()),
        };
        assert!(filter.matches(&alert(4)));
        assert!(!filter.matches(&payment()));
    }
}
