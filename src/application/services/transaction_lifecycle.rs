//! Transaction lifecycle: admission, exit and cancellation
//!
//! Every multi-record change runs in one [`LifecycleUnit`]; events and
//! metrics are emitted only after the unit commits.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::tariff_resolver::TariffResolver;
use crate::application::events::{
    Event, SecurityAlertEvent, SharedEventBus, TransactionCancelledEvent, VehicleEnteredEvent,
    VehicleExitedEvent,
};
use crate::domain::customer::{normalize_plate, ContactInfo, DocumentRef};
use crate::domain::tariff::model::duration_minutes;
use crate::domain::transaction::{
    Evidence, ExitSettlement, NewTransaction, PaymentStatus, Transaction, TransactionStatus,
};
use crate::domain::{DomainError, DomainResult, LifecycleStore, RepositoryProvider};

/// Vehicle admission request (raw operator input)
#[derive(Debug, Clone, Default)]
pub struct EntryCommand {
    pub plate: String,
    pub document_type: String,
    pub document_number: String,
    pub zone_id: i32,
    pub space_id: i32,
    pub operator_id: i32,
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub evidence: Evidence,
    pub notes: Option<String>,
}

/// Vehicle exit request
#[derive(Debug, Clone, Default)]
pub struct ExitCommand {
    pub document_type: String,
    pub document_number: String,
    pub operator_id: i32,
    pub evidence: Evidence,
}

pub struct TransactionLifecycleManager {
    repos: Arc<dyn RepositoryProvider>,
    store: Arc<dyn LifecycleStore>,
    tariffs: Arc<TariffResolver>,
    events: SharedEventBus,
    default_currency: String,
}

pub(crate) fn not_found(entity: &'static str, id: i32) -> DomainError {
    DomainError::NotFound {
        entity,
        field: "id",
        value: id.to_string(),
    }
}

pub(crate) fn invalid_state(tx: &Transaction, operation: &'static str) -> DomainError {
    DomainError::InvalidTransactionState {
        transaction_id: tx.id,
        operation,
        status: tx.status.as_str().to_string(),
        payment_status: tx.payment_status.as_str().to_string(),
    }
}

pub(crate) fn changed_concurrently(transaction_id: i32) -> DomainError {
    DomainError::Conflict(format!(
        "transaction {} was modified concurrently",
        transaction_id
    ))
}

impl TransactionLifecycleManager {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        store: Arc<dyn LifecycleStore>,
        tariffs: Arc<TariffResolver>,
        events: SharedEventBus,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            repos,
            store,
            tariffs,
            events,
            default_currency: default_currency.into(),
        }
    }

    // ── Entry ──────────────────────────────────────────────────

    pub async fn record_entry(&self, cmd: EntryCommand) -> DomainResult<Transaction> {
        self.record_entry_at(cmd, Utc::now()).await
    }

    pub async fn record_entry_at(
        &self,
        cmd: EntryCommand,
        now: DateTime<Utc>,
    ) -> DomainResult<Transaction> {
        let plate = normalize_plate(&cmd.plate)?;
        let document = DocumentRef::new(&cmd.document_type, &cmd.document_number)?;
        let contact = ContactInfo::from_raw(
            cmd.customer_name.as_deref(),
            cmd.email.as_deref(),
            cmd.phone.as_deref(),
        );
        contact.validate()?;
        validate_evidence(&cmd.evidence)?;

        let zone = self
            .repos
            .facilities()
            .find_zone(cmd.zone_id)
            .await?
            .ok_or_else(|| not_found("Zone", cmd.zone_id))?;
        let parking = self
            .repos
            .facilities()
            .find_parking(zone.parking_id)
            .await?
            .ok_or_else(|| not_found("Parking", zone.parking_id))?;
        zone.check_operational(&parking, now)
            .map_err(|reason| DomainError::ZoneNotOperational {
                zone_id: zone.id,
                reason,
            })?;

        let unit = self.store.begin().await?;

        let space = unit
            .find_space(cmd.space_id)
            .await?
            .ok_or_else(|| not_found("Space", cmd.space_id))?;
        if space.zone_id != zone.id {
            return Err(DomainError::Validation(format!(
                "space {} does not belong to zone {}",
                space.id, zone.id
            )));
        }
        if !space.is_available() {
            return Err(DomainError::SpaceNotAvailable {
                space_id: space.id,
                status: space.status.as_str().to_string(),
            });
        }

        let vehicle = unit.resolve_or_create_vehicle(&plate, now).await?;
        if let Some(existing) = unit.active_transaction_for_vehicle(vehicle.id).await? {
            return Err(DomainError::VehicleAlreadyInside {
                plate,
                transaction_id: Some(existing),
            });
        }

        if !unit.allocate_space(space.id, now).await? {
            return Err(DomainError::SpaceNotAvailable {
                space_id: space.id,
                status: space.status.as_str().to_string(),
            });
        }

        let customer = unit
            .resolve_or_create_customer(&document, &contact, now)
            .await?;

        let tx = unit
            .insert_transaction(NewTransaction {
                vehicle_id: vehicle.id,
                customer_id: customer.id,
                parking_id: parking.id,
                zone_id: zone.id,
                space_id: space.id,
                plate_number: plate,
                entry_document: document,
                entry_time: now,
                currency: self.default_currency.clone(),
                entry_evidence: cmd.evidence,
                entry_operator_id: cmd.operator_id,
                notes: cmd.notes,
            })
            .await?;

        unit.commit().await?;

        info!(
            transaction_id = tx.id,
            plate = %tx.plate_number,
            space_id = tx.space_id,
            zone_id = tx.zone_id,
            "Vehicle entered"
        );
        metrics::counter!("parking_entries_total").increment(1);
        self.events.publish(Event::VehicleEntered(VehicleEnteredEvent {
            transaction_id: tx.id,
            plate_number: tx.plate_number.clone(),
            parking_id: tx.parking_id,
            zone_id: tx.zone_id,
            space_id: tx.space_id,
            entry_time: tx.entry_time,
            operator_id: tx.entry_operator_id,
        }));

        Ok(tx)
    }

    // ── Exit ───────────────────────────────────────────────────

    pub async fn record_exit(&self, transaction_id: i32, cmd: ExitCommand) -> DomainResult<Transaction> {
        self.record_exit_at(transaction_id, cmd, Utc::now()).await
    }

    /// Exit for the vehicle's current stay, looked up by plate.
    pub async fn record_exit_by_plate(
        &self,
        plate: &str,
        cmd: ExitCommand,
    ) -> DomainResult<Transaction> {
        let plate = normalize_plate(plate)?;
        let tx = self
            .repos
            .transactions()
            .find_active_by_plate(&plate)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Active transaction",
                field: "plate",
                value: plate,
            })?;
        self.record_exit_at(tx.id, cmd, Utc::now()).await
    }

    pub async fn record_exit_at(
        &self,
        transaction_id: i32,
        cmd: ExitCommand,
        now: DateTime<Utc>,
    ) -> DomainResult<Transaction> {
        validate_evidence(&cmd.evidence)?;

        let tx = self
            .repos
            .transactions()
            .find_by_id(transaction_id)
            .await?
            .ok_or_else(|| not_found("Transaction", transaction_id))?;
        if !tx.is_active() {
            return Err(invalid_state(&tx, "exit"));
        }

        // Gate before any format check: a malformed document is a mismatch.
        let document = DocumentRef::presented(&cmd.document_type, &cmd.document_number);
        if !tx.verify_exit_document(&document) {
            self.raise_security_alert(&tx, &document, cmd.operator_id, now);
            return Err(DomainError::DocumentMismatch {
                transaction_id: tx.id,
            });
        }

        let exit_time = now.max(tx.entry_time);
        let minutes = duration_minutes(tx.entry_time, exit_time);
        let quote = self
            .tariffs
            .quote_stay(tx.parking_id, tx.entry_time, exit_time)
            .await?;

        let unit = self.store.begin().await?;
        let mut tx = unit
            .find_transaction(transaction_id)
            .await?
            .ok_or_else(|| not_found("Transaction", transaction_id))?;
        if !tx.is_active() {
            return Err(invalid_state(&tx, "exit"));
        }

        tx.complete(ExitSettlement {
            exit_time,
            exit_document: document,
            exit_evidence: cmd.evidence,
            operator_id: cmd.operator_id,
            duration_minutes: minutes,
            quote,
        })?;

        if !unit
            .save_transaction(&tx, TransactionStatus::Active, PaymentStatus::Unpaid)
            .await?
        {
            return Err(changed_concurrently(tx.id));
        }
        if !unit.release_space(tx.space_id, exit_time).await? {
            return Err(DomainError::Conflict(format!(
                "space {} was not occupied by transaction {}",
                tx.space_id, tx.id
            )));
        }
        unit.commit().await?;

        let total = tx.total_amount.unwrap_or_default();
        info!(
            transaction_id = tx.id,
            plate = %tx.plate_number,
            duration_minutes = minutes,
            total = %total,
            currency = %tx.currency,
            "Vehicle exited"
        );
        metrics::counter!("parking_exits_total").increment(1);
        self.events.publish(Event::VehicleExited(VehicleExitedEvent {
            transaction_id: tx.id,
            plate_number: tx.plate_number.clone(),
            zone_id: tx.zone_id,
            space_id: tx.space_id,
            exit_time,
            duration_minutes: minutes,
            total_amount: total,
            currency: tx.currency.clone(),
        }));

        Ok(tx)
    }

    fn raise_security_alert(
        &self,
        tx: &Transaction,
        presented: &DocumentRef,
        operator_id: i32,
        now: DateTime<Utc>,
    ) {
        warn!(
            transaction_id = tx.id,
            plate = %tx.plate_number,
            presented = %presented,
            operator_id,
            "Exit document does not match entry document"
        );
        metrics::counter!("parking_security_alerts_total").increment(1);
        self.events.publish(Event::SecurityAlert(SecurityAlertEvent {
            transaction_id: tx.id,
            zone_id: tx.zone_id,
            plate_number: tx.plate_number.clone(),
            presented_document: presented.to_string(),
            operator_id,
            timestamp: now,
        }));
    }

    // ── Cancellation ───────────────────────────────────────────

    pub async fn cancel(
        &self,
        transaction_id: i32,
        operator_id: i32,
        reason: &str,
    ) -> DomainResult<Transaction> {
        self.cancel_at(transaction_id, operator_id, reason, Utc::now())
            .await
    }

    pub async fn cancel_at(
        &self,
        transaction_id: i32,
        operator_id: i32,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Transaction> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::Validation(
                "cancellation reason is required".into(),
            ));
        }

        let unit = self.store.begin().await?;
        let mut tx = unit
            .find_transaction(transaction_id)
            .await?
            .ok_or_else(|| not_found("Transaction", transaction_id))?;
        if !tx.is_active() {
            return Err(invalid_state(&tx, "cancel"));
        }

        let at = now.max(tx.entry_time);
        tx.cancel(at, operator_id, reason.to_string())?;

        if !unit
            .save_transaction(&tx, TransactionStatus::Active, PaymentStatus::Unpaid)
            .await?
        {
            return Err(changed_concurrently(tx.id));
        }
        if !unit.release_space(tx.space_id, at).await? {
            return Err(DomainError::Conflict(format!(
                "space {} was not occupied by transaction {}",
                tx.space_id, tx.id
            )));
        }
        unit.commit().await?;

        info!(transaction_id = tx.id, operator_id, reason, "Transaction cancelled");
        self.events
            .publish(Event::TransactionCancelled(TransactionCancelledEvent {
                transaction_id: tx.id,
                zone_id: tx.zone_id,
                space_id: tx.space_id,
                reason: reason.to_string(),
                operator_id,
                timestamp: at,
            }));

        Ok(tx)
    }
}

fn validate_evidence(evidence: &Evidence) -> DomainResult<()> {
    match evidence.plate_confidence {
        Some(c) if !(0.0..=1.0).contains(&c) => Err(DomainError::Validation(
            "plate confidence must be between 0 and 1".into(),
        )),
        _ => Ok(()),
    }
}
