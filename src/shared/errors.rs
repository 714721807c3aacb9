use thiserror::Error;

/// Failures surfaced by the lifecycle engine and its collaborators.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Zone {zone_id} is not operational: {reason}")]
    ZoneNotOperational { zone_id: i32, reason: String },

    #[error("Space {space_id} is not available (status {status})")]
    SpaceNotAvailable { space_id: i32, status: String },

    #[error("Vehicle {plate} already has an active transaction")]
    VehicleAlreadyInside {
        plate: String,
        transaction_id: Option<i32>,
    },

    #[error("Exit document does not match the entry document of transaction {transaction_id}")]
    DocumentMismatch { transaction_id: i32 },

    #[error(
        "Transaction {transaction_id} cannot {operation}: status {status}, payment status {payment_status}"
    )]
    InvalidTransactionState {
        transaction_id: i32,
        operation: &'static str,
        status: String,
        payment_status: String,
    },

    #[error(transparent)]
    InvalidTransition(#[from] TransitionRejected),

    #[error("No active tariff configured for parking {parking_id} and shift {shift_id}")]
    TariffNotConfigured { parking_id: i32, shift_id: i32 },

    #[error("No shift covers parking {parking_id} at {at}")]
    NoShiftCoverage { parking_id: i32, at: String },

    #[error("Payment of {offered} rejected: {required} required ({policy} policy)")]
    PaymentRejected {
        required: String,
        offered: String,
        policy: &'static str,
    },

    #[error("Space {space_id} is occupied by an active transaction")]
    SpaceOccupied { space_id: i32 },

    #[error("Database error: {0}")]
    Database(String),
}

impl DomainError {
    /// Whether this error is likely transient (lock wait timeout, lost
    /// connection) and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Database(_))
    }

    /// Configuration errors block billing until an administrator fixes
    /// the tariff setup.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DomainError::TariffNotConfigured { .. } | DomainError::NoShiftCoverage { .. }
        )
    }
}

/// A state machine refused a move it does not model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} cannot leave {from} on {event}")]
pub struct TransitionRejected {
    pub entity: &'static str,
    pub from: &'static str,
    pub event: &'static str,
}

impl TransitionRejected {
    pub fn new(entity: &'static str, from: &'static str, event: &'static str) -> Self {
        Self {
            entity,
            from,
            event,
        }
    }
}
