//! SeaORM implementation of PaymentRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use super::db_err;
use crate::domain::payment::{Payment, PaymentRecordStatus, PaymentRepository, RefundDetails};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::payment;
use crate::shared::money::from_minor_units;

pub struct SeaOrmPaymentRepository {
    db: DatabaseConnection,
}

impl SeaOrmPaymentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(crate) fn payment_to_domain(m: payment::Model) -> DomainResult<Payment> {
    let status = PaymentRecordStatus::from_str(&m.status)
        .ok_or_else(|| DomainError::Database(format!("unknown payment status '{}'", m.status)))?;
    let refund = match (m.refund_amount_cents, m.refund_date, m.refunded_by) {
        (Some(cents), Some(refunded_at), Some(refunded_by)) => Some(RefundDetails {
            amount: from_minor_units(cents),
            refunded_at,
            reason: m.refund_reason.unwrap_or_default(),
            refunded_by,
        }),
        _ => None,
    };
    Ok(Payment {
        id: m.id,
        transaction_id: m.transaction_id,
        payment_type_id: m.payment_type_id,
        amount: from_minor_units(m.amount_cents),
        currency: m.currency,
        reference_number: m.reference_number,
        status,
        operator_id: m.operator_id,
        paid_at: m.paid_at,
        notes: m.notes,
        refund,
    })
}

#[async_trait]
impl PaymentRepository for SeaOrmPaymentRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Payment>> {
        payment::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(payment_to_domain)
            .transpose()
    }

    async fn find_by_transaction(&self, transaction_id: i32) -> DomainResult<Option<Payment>> {
        payment::Entity::find()
            .filter(payment::Column::TransactionId.eq(transaction_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(payment_to_domain)
            .transpose()
    }
}
