//! # Smart Parking
//!
//! Parking transaction lifecycle service: vehicle admission, shift-based
//! tariff resolution, document-verified exit and payment settlement.
//!
//! ## Layout
//!
//! - **domain**: entities, state machines, repository ports
//! - **application**: lifecycle, payment and query services; event bus
//! - **infrastructure**: SeaORM entities, migrations and repositories
//! - **interfaces**: REST API (Swagger at `/docs`) and WebSocket event stream
//! - **server**: process wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

#[cfg(test)]
mod test_support;

pub use config::{default_config_path, AppConfig, ConfigError};

pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

pub use interfaces::{create_api_router, ApiState};

pub use application::events::{create_event_bus, Event, EventBus, SharedEventBus};
