//! SeaORM implementation of TransactionRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::db_err;
use crate::domain::customer::DocumentRef;
use crate::domain::tariff::TariffLine;
use crate::domain::transaction::{
    CaptureMethod, Evidence, PaymentStatus, ReceiptState, ReceiptStatus, Transaction,
    TransactionFilter, TransactionRepository, TransactionStatus,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::parking_transaction;
use crate::shared::money::{from_minor_units, to_minor_units};
use crate::shared::{PageRequest, PaginatedResult};

pub struct SeaOrmTransactionRepository {
    db: DatabaseConnection,
}

impl SeaOrmTransactionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn unknown(field: &str, value: &str) -> DomainError {
    DomainError::Database(format!("unknown {} '{}'", field, value))
}

fn receipt_status(value: Option<String>) -> Option<ReceiptStatus> {
    value.as_deref().and_then(ReceiptStatus::from_str)
}

pub(crate) fn transaction_to_domain(m: parking_transaction::Model) -> DomainResult<Transaction> {
    let status = TransactionStatus::from_str(&m.status).ok_or_else(|| unknown("status", &m.status))?;
    let payment_status = PaymentStatus::from_str(&m.payment_status)
        .ok_or_else(|| unknown("payment status", &m.payment_status))?;

    let exit_document = match (m.exit_document_type, m.exit_document_number) {
        (Some(doc_type), Some(number)) => Some(DocumentRef { doc_type, number }),
        _ => None,
    };
    let exit_evidence = m.exit_method.as_deref().map(|method| Evidence {
        method: CaptureMethod::from_str(method).unwrap_or_default(),
        photo_url: m.exit_photo_url.clone(),
        plate_confidence: m.exit_plate_confidence,
    });
    let rate_ids: Vec<i32> = m
        .rate_ids
        .as_deref()
        .and_then(|json| serde_json::from_str(json).ok())
        .unwrap_or_default();
    let tariff_lines: Vec<TariffLine> = m
        .tariff_breakdown
        .as_deref()
        .and_then(|json| serde_json::from_str(json).ok())
        .unwrap_or_default();

    Ok(Transaction {
        id: m.id,
        vehicle_id: m.vehicle_id,
        customer_id: m.customer_id,
        parking_id: m.parking_id,
        zone_id: m.zone_id,
        space_id: m.space_id,
        plate_number: m.plate_number,
        entry_document: DocumentRef {
            doc_type: m.entry_document_type,
            number: m.entry_document_number,
        },
        exit_document,
        entry_time: m.entry_time,
        exit_time: m.exit_time,
        duration_minutes: m.duration_minutes,
        calculated_amount: m.calculated_amount_cents.map(from_minor_units),
        discount_amount: from_minor_units(m.discount_amount_cents),
        total_amount: m.total_amount_cents.map(from_minor_units),
        currency: m.currency,
        rate_ids,
        tariff_lines,
        status,
        payment_status,
        entry_evidence: Evidence {
            method: CaptureMethod::from_str(&m.entry_method).unwrap_or_default(),
            photo_url: m.entry_photo_url,
            plate_confidence: m.entry_plate_confidence,
        },
        exit_evidence,
        entry_operator_id: m.entry_operator_id,
        exit_operator_id: m.exit_operator_id,
        notes: m.notes,
        cancellation_reason: m.cancellation_reason,
        cancelled_by: m.cancelled_by,
        cancelled_at: m.cancelled_at,
        receipt: ReceiptState {
            sent: m.receipt_sent,
            sent_at: m.receipt_sent_at,
            email_status: receipt_status(m.receipt_email_status),
            whatsapp_status: receipt_status(m.receipt_whatsapp_status),
        },
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> DomainResult<String> {
    serde_json::to_string(value).map_err(|e| DomainError::Database(e.to_string()))
}

/// Mutable columns of a transaction. Identity columns (id, vehicle,
/// space, entry data) are left `NotSet`.
pub(crate) fn transaction_changes(tx: &Transaction) -> DomainResult<parking_transaction::ActiveModel> {
    let (rate_ids, tariff_breakdown) = if tx.tariff_lines.is_empty() && tx.rate_ids.is_empty() {
        (None, None)
    } else {
        (Some(to_json(&tx.rate_ids)?), Some(to_json(&tx.tariff_lines)?))
    };
    let exit = tx.exit_evidence.as_ref();

    Ok(parking_transaction::ActiveModel {
        id: NotSet,
        vehicle_id: NotSet,
        customer_id: NotSet,
        parking_id: NotSet,
        zone_id: NotSet,
        space_id: NotSet,
        plate_number: NotSet,
        entry_document_type: NotSet,
        entry_document_number: NotSet,
        exit_document_type: Set(tx.exit_document.as_ref().map(|d| d.doc_type.clone())),
        exit_document_number: Set(tx.exit_document.as_ref().map(|d| d.number.clone())),
        entry_time: NotSet,
        exit_time: Set(tx.exit_time),
        duration_minutes: Set(tx.duration_minutes),
        calculated_amount_cents: Set(tx.calculated_amount.map(to_minor_units)),
        discount_amount_cents: Set(to_minor_units(tx.discount_amount)),
        total_amount_cents: Set(tx.total_amount.map(to_minor_units)),
        currency: Set(tx.currency.clone()),
        rate_ids: Set(rate_ids),
        tariff_breakdown: Set(tariff_breakdown),
        status: Set(tx.status.as_str().to_string()),
        payment_status: Set(tx.payment_status.as_str().to_string()),
        entry_method: NotSet,
        entry_photo_url: NotSet,
        entry_plate_confidence: NotSet,
        exit_method: Set(exit.map(|e| e.method.as_str().to_string())),
        exit_photo_url: Set(exit.and_then(|e| e.photo_url.clone())),
        exit_plate_confidence: Set(exit.and_then(|e| e.plate_confidence)),
        entry_operator_id: NotSet,
        exit_operator_id: Set(tx.exit_operator_id),
        notes: Set(tx.notes.clone()),
        cancellation_reason: Set(tx.cancellation_reason.clone()),
        cancelled_by: Set(tx.cancelled_by),
        cancelled_at: Set(tx.cancelled_at),
        receipt_sent: Set(tx.receipt.sent),
        receipt_sent_at: Set(tx.receipt.sent_at),
        receipt_email_status: Set(tx.receipt.email_status.map(|s| s.as_str().to_string())),
        receipt_whatsapp_status: Set(tx.receipt.whatsapp_status.map(|s| s.as_str().to_string())),
        created_at: NotSet,
        updated_at: Set(tx.updated_at),
    })
}

fn filter_condition(filter: &TransactionFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(status) = filter.status {
        condition = condition.add(parking_transaction::Column::Status.eq(status.as_str()));
    }
    if let Some(payment_status) = filter.payment_status {
        condition =
            condition.add(parking_transaction::Column::PaymentStatus.eq(payment_status.as_str()));
    }
    if let Some(parking_id) = filter.parking_id {
        condition = condition.add(parking_transaction::Column::ParkingId.eq(parking_id));
    }
    if let Some(zone_id) = filter.zone_id {
        condition = condition.add(parking_transaction::Column::ZoneId.eq(zone_id));
    }
    if let Some(plate) = filter.plate.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        condition = condition.add(
            parking_transaction::Column::PlateNumber.contains(plate.to_uppercase()),
        );
    }
    if let Some(from) = filter.entry_from {
        condition = condition.add(parking_transaction::Column::EntryTime.gte(from));
    }
    if let Some(to) = filter.entry_to {
        condition = condition.add(parking_transaction::Column::EntryTime.lt(to));
    }
    condition
}

fn to_domain_all(models: Vec<parking_transaction::Model>) -> DomainResult<Vec<Transaction>> {
    models.into_iter().map(transaction_to_domain).collect()
}

// ── TransactionRepository impl ──────────────────────────────────

#[async_trait]
impl TransactionRepository for SeaOrmTransactionRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Transaction>> {
        parking_transaction::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(transaction_to_domain)
            .transpose()
    }

    async fn find_active_by_plate(&self, plate: &str) -> DomainResult<Option<Transaction>> {
        parking_transaction::Entity::find()
            .filter(parking_transaction::Column::PlateNumber.eq(plate))
            .filter(parking_transaction::Column::Status.eq(TransactionStatus::Active.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(transaction_to_domain)
            .transpose()
    }

    async fn list_active(&self, zone_id: Option<i32>) -> DomainResult<Vec<Transaction>> {
        let mut query = parking_transaction::Entity::find()
            .filter(parking_transaction::Column::Status.eq(TransactionStatus::Active.as_str()));
        if let Some(zone_id) = zone_id {
            query = query.filter(parking_transaction::Column::ZoneId.eq(zone_id));
        }
        let models = query
            .order_by_asc(parking_transaction::Column::EntryTime)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        to_domain_all(models)
    }

    async fn list(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Transaction>> {
        let query = parking_transaction::Entity::find().filter(filter_condition(filter));

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let models = query
            .order_by_desc(parking_transaction::Column::EntryTime)
            .order_by_desc(parking_transaction::Column::Id)
            .offset(page.offset())
            .limit(page.limit as u64)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PaginatedResult::new(
            to_domain_all(models)?,
            total,
            page.page,
            page.limit,
        ))
    }

    async fn update_receipt_state(&self, id: i32, receipt: &ReceiptState) -> DomainResult<()> {
        debug!(
            "Updating receipt state for transaction {}: sent={}",
            id, receipt.sent
        );
        let result = parking_transaction::Entity::update_many()
            .col_expr(
                parking_transaction::Column::ReceiptSent,
                Expr::value(receipt.sent),
            )
            .col_expr(
                parking_transaction::Column::ReceiptSentAt,
                Expr::value(receipt.sent_at),
            )
            .col_expr(
                parking_transaction::Column::ReceiptEmailStatus,
                Expr::value(receipt.email_status.map(|s| s.as_str().to_string())),
            )
            .col_expr(
                parking_transaction::Column::ReceiptWhatsappStatus,
                Expr::value(receipt.whatsapp_status.map(|s| s.as_str().to_string())),
            )
            .col_expr(
                parking_transaction::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(parking_transaction::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound {
                entity: "Transaction",
                field: "id",
                value: id.to_string(),
            });
        }
        Ok(())
    }
}
