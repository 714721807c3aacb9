//! Domain layer
//!
//! Business entities, state machines and repository ports. No I/O.

pub mod customer;
pub mod events;
pub mod facility;
pub mod lifecycle;
pub mod payment;
pub mod repositories;
pub mod tariff;
pub mod transaction;

pub use customer::{normalize_plate, ContactInfo, Customer, DocumentRef, Vehicle};
pub use events::{Event, EventMessage};
pub use facility::{Parking, RecordStatus, Space, SpaceEvent, SpaceStatus, Zone};
pub use lifecycle::{LifecycleStore, LifecycleUnit};
pub use payment::{Payment, PaymentPolicy, PaymentRecordStatus};
pub use repositories::{DomainResult, RepositoryProvider};
pub use tariff::{RoundingPolicy, TariffQuote};
pub use transaction::{
    CaptureMethod, Evidence, PaymentStatus, ReceiptChannel, ReceiptStatus, Transaction,
    TransactionStatus,
};

pub use crate::shared::errors::DomainError;
