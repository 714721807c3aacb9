//! SeaORM-backed unit of work
//!
//! Wraps one `DatabaseTransaction`. SeaORM rolls back a transaction that
//! is dropped without `commit`, which gives the all-or-nothing behavior
//! the lifecycle port promises.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, Set, SqlErr, TransactionTrait,
};

use super::customer_repository::customer_to_domain;
use super::db_err;
use super::facility_repository::{load_space, transition_space};
use super::payment_repository::payment_to_domain;
use super::transaction_repository::{transaction_changes, transaction_to_domain};
use crate::domain::customer::{ContactInfo, Customer, DocumentRef, Vehicle};
use crate::domain::facility::{Space, SpaceEvent, SpaceStatus};
use crate::domain::lifecycle::{LifecycleStore, LifecycleUnit};
use crate::domain::payment::{NewPayment, Payment, PaymentRecordStatus};
use crate::domain::transaction::{NewTransaction, PaymentStatus, Transaction, TransactionStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{customer, parking_transaction, payment, vehicle};
use crate::shared::money::to_minor_units;

pub struct SeaOrmLifecycleStore {
    db: DatabaseConnection,
}

impl SeaOrmLifecycleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LifecycleStore for SeaOrmLifecycleStore {
    async fn begin(&self) -> DomainResult<Box<dyn LifecycleUnit>> {
        let txn = self.db.begin().await.map_err(db_err)?;
        Ok(Box::new(SeaOrmLifecycleUnit { txn }))
    }
}

pub struct SeaOrmLifecycleUnit {
    txn: DatabaseTransaction,
}

impl SeaOrmLifecycleUnit {
    /// Conditional update from `from` to whatever the space machine
    /// yields for `event`; a move it rejects never reaches the database.
    async fn engine_move(
        &self,
        space_id: i32,
        from: SpaceStatus,
        event: SpaceEvent,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let to = from.apply(event)?;
        transition_space(&self.txn, space_id, from, None, to, at).await
    }
}

fn unique_violation(e: &DbErr) -> Option<String> {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => Some(msg),
        _ => None,
    }
}

#[async_trait]
impl LifecycleUnit for SeaOrmLifecycleUnit {
    async fn find_space(&self, space_id: i32) -> DomainResult<Option<Space>> {
        load_space(&self.txn, space_id).await
    }

    async fn allocate_space(&self, space_id: i32, at: DateTime<Utc>) -> DomainResult<bool> {
        self.engine_move(space_id, SpaceStatus::Available, SpaceEvent::Allocate, at)
            .await
    }

    async fn release_space(&self, space_id: i32, at: DateTime<Utc>) -> DomainResult<bool> {
        self.engine_move(space_id, SpaceStatus::Occupied, SpaceEvent::Release, at)
            .await
    }

    async fn resolve_or_create_vehicle(
        &self,
        plate: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<Vehicle> {
        let existing = vehicle::Entity::find()
            .filter(vehicle::Column::PlateNumber.eq(plate))
            .one(&self.txn)
            .await
            .map_err(db_err)?;

        let model = match existing {
            Some(model) => model,
            None => {
                debug!("Registering vehicle {}", plate);
                vehicle::ActiveModel {
                    id: NotSet,
                    plate_number: Set(plate.to_string()),
                    created_at: Set(at),
                }
                .insert(&self.txn)
                .await
                .map_err(db_err)?
            }
        };
        Ok(Vehicle {
            id: model.id,
            plate_number: model.plate_number,
            created_at: model.created_at,
        })
    }

    async fn resolve_or_create_customer(
        &self,
        document: &DocumentRef,
        contact: &ContactInfo,
        at: DateTime<Utc>,
    ) -> DomainResult<Customer> {
        let existing = customer::Entity::find()
            .filter(customer::Column::DocumentType.eq(document.doc_type.as_str()))
            .filter(customer::Column::DocumentNumber.eq(document.number.as_str()))
            .one(&self.txn)
            .await
            .map_err(db_err)?;

        let model = match existing {
            Some(model) if contact.is_empty() => model,
            Some(model) => {
                let mut active: customer::ActiveModel = model.into();
                if let Some(first_name) = &contact.first_name {
                    active.first_name = Set(Some(first_name.clone()));
                }
                if let Some(last_name) = &contact.last_name {
                    active.last_name = Set(Some(last_name.clone()));
                }
                if let Some(email) = &contact.email {
                    active.email = Set(Some(email.clone()));
                }
                if let Some(phone) = &contact.phone {
                    active.phone = Set(Some(phone.clone()));
                }
                active.updated_at = Set(at);
                active.update(&self.txn).await.map_err(db_err)?
            }
            None => {
                debug!("Registering customer {}", document);
                customer::ActiveModel {
                    id: NotSet,
                    document_type: Set(document.doc_type.clone()),
                    document_number: Set(document.number.clone()),
                    first_name: Set(contact.first_name.clone()),
                    last_name: Set(contact.last_name.clone()),
                    email: Set(contact.email.clone()),
                    phone: Set(contact.phone.clone()),
                    created_at: Set(at),
                    updated_at: Set(at),
                }
                .insert(&self.txn)
                .await
                .map_err(db_err)?
            }
        };
        Ok(customer_to_domain(model))
    }

    async fn active_transaction_for_vehicle(&self, vehicle_id: i32) -> DomainResult<Option<i32>> {
        let model = parking_transaction::Entity::find()
            .filter(parking_transaction::Column::VehicleId.eq(vehicle_id))
            .filter(parking_transaction::Column::Status.eq(TransactionStatus::Active.as_str()))
            .one(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(model.map(|m| m.id))
    }

    async fn insert_transaction(&self, new: NewTransaction) -> DomainResult<Transaction> {
        let plate = new.plate_number.clone();
        let space_id = new.space_id;
        let model = parking_transaction::ActiveModel {
            id: NotSet,
            vehicle_id: Set(new.vehicle_id),
            customer_id: Set(new.customer_id),
            parking_id: Set(new.parking_id),
            zone_id: Set(new.zone_id),
            space_id: Set(new.space_id),
            plate_number: Set(new.plate_number),
            entry_document_type: Set(new.entry_document.doc_type),
            entry_document_number: Set(new.entry_document.number),
            exit_document_type: Set(None),
            exit_document_number: Set(None),
            entry_time: Set(new.entry_time),
            exit_time: Set(None),
            duration_minutes: Set(None),
            calculated_amount_cents: Set(None),
            discount_amount_cents: Set(0),
            total_amount_cents: Set(None),
            currency: Set(new.currency),
            rate_ids: Set(None),
            tariff_breakdown: Set(None),
            status: Set(TransactionStatus::Active.as_str().to_string()),
            payment_status: Set(PaymentStatus::Unpaid.as_str().to_string()),
            entry_method: Set(new.entry_evidence.method.as_str().to_string()),
            entry_photo_url: Set(new.entry_evidence.photo_url),
            entry_plate_confidence: Set(new.entry_evidence.plate_confidence),
            exit_method: Set(None),
            exit_photo_url: Set(None),
            exit_plate_confidence: Set(None),
            entry_operator_id: Set(new.entry_operator_id),
            exit_operator_id: Set(None),
            notes: Set(new.notes),
            cancellation_reason: Set(None),
            cancelled_by: Set(None),
            cancelled_at: Set(None),
            receipt_sent: Set(false),
            receipt_sent_at: Set(None),
            receipt_email_status: Set(None),
            receipt_whatsapp_status: Set(None),
            created_at: Set(new.entry_time),
            updated_at: Set(new.entry_time),
        };

        let inserted = model.insert(&self.txn).await.map_err(|e| match unique_violation(&e) {
            Some(msg) if msg.contains("vehicle_id") => DomainError::VehicleAlreadyInside {
                plate: plate.clone(),
                transaction_id: None,
            },
            Some(msg) if msg.contains("space_id") => DomainError::SpaceNotAvailable {
                space_id,
                status: SpaceStatus::Occupied.as_str().to_string(),
            },
            _ => db_err(e),
        })?;
        transaction_to_domain(inserted)
    }

    async fn find_transaction(&self, id: i32) -> DomainResult<Option<Transaction>> {
        parking_transaction::Entity::find_by_id(id)
            .one(&self.txn)
            .await
            .map_err(db_err)?
            .map(transaction_to_domain)
            .transpose()
    }

    async fn save_transaction(
        &self,
        transaction: &Transaction,
        expected_status: TransactionStatus,
        expected_payment_status: PaymentStatus,
    ) -> DomainResult<bool> {
        debug!(
            "Saving transaction {}: {}/{} -> {}/{}",
            transaction.id,
            expected_status.as_str(),
            expected_payment_status.as_str(),
            transaction.status.as_str(),
            transaction.payment_status.as_str()
        );
        let result = parking_transaction::Entity::update_many()
            .set(transaction_changes(transaction)?)
            .filter(parking_transaction::Column::Id.eq(transaction.id))
            .filter(parking_transaction::Column::Status.eq(expected_status.as_str()))
            .filter(
                parking_transaction::Column::PaymentStatus.eq(expected_payment_status.as_str()),
            )
            .exec(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected == 1)
    }

    async fn find_payment_by_transaction(
        &self,
        transaction_id: i32,
    ) -> DomainResult<Option<Payment>> {
        payment::Entity::find()
            .filter(payment::Column::TransactionId.eq(transaction_id))
            .one(&self.txn)
            .await
            .map_err(db_err)?
            .map(payment_to_domain)
            .transpose()
    }

    async fn insert_payment(&self, new: NewPayment) -> DomainResult<Payment> {
        let transaction_id = new.transaction_id;
        let model = payment::ActiveModel {
            id: NotSet,
            transaction_id: Set(new.transaction_id),
            payment_type_id: Set(new.payment_type_id),
            amount_cents: Set(to_minor_units(new.amount)),
            currency: Set(new.currency),
            reference_number: Set(new.reference_number),
            status: Set(PaymentRecordStatus::Completed.as_str().to_string()),
            operator_id: Set(new.operator_id),
            paid_at: Set(new.paid_at),
            notes: Set(new.notes),
            refund_amount_cents: Set(None),
            refund_date: Set(None),
            refund_reason: Set(None),
            refunded_by: Set(None),
            created_at: Set(new.paid_at),
            updated_at: Set(new.paid_at),
        };
        let inserted = model
            .insert(&self.txn)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => DomainError::Conflict(format!(
                    "transaction {} already has a payment",
                    transaction_id
                )),
                None => db_err(e),
            })?;
        payment_to_domain(inserted)
    }

    async fn save_payment(&self, p: &Payment) -> DomainResult<()> {
        let refund = p.refund.as_ref();
        let updated_at = refund.map(|r| r.refunded_at).unwrap_or(p.paid_at);
        let model = payment::ActiveModel {
            id: Set(p.id),
            status: Set(p.status.as_str().to_string()),
            notes: Set(p.notes.clone()),
            refund_amount_cents: Set(refund.map(|r| to_minor_units(r.amount))),
            refund_date: Set(refund.map(|r| r.refunded_at)),
            refund_reason: Set(refund.map(|r| r.reason.clone())),
            refunded_by: Set(refund.map(|r| r.refunded_by)),
            updated_at: Set(updated_at),
            ..Default::default()
        };
        model.update(&self.txn).await.map_err(db_err)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        self.txn.commit().await.map_err(db_err)
    }
}
