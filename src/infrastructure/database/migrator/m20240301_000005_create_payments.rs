//! Create payments table
//!
//! At most one payment per transaction.

use sea_orm_migration::prelude::*;

use super::m20240301_000004_create_parking_transactions::ParkingTransactions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::TransactionId).integer().not_null().unique_key())
                    .col(ColumnDef::new(Payments::PaymentTypeId).integer().not_null())
                    .col(ColumnDef::new(Payments::AmountCents).big_integer().not_null())
                    .col(ColumnDef::new(Payments::Currency).string().not_null())
                    .col(ColumnDef::new(Payments::ReferenceNumber).string())
                    .col(ColumnDef::new(Payments::Status).string().not_null().default("COMPLETED"))
                    .col(ColumnDef::new(Payments::OperatorId).integer().not_null())
                    .col(ColumnDef::new(Payments::PaidAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Payments::Notes).text())
                    .col(ColumnDef::new(Payments::RefundAmountCents).big_integer())
                    .col(ColumnDef::new(Payments::RefundDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(Payments::RefundReason).string())
                    .col(ColumnDef::new(Payments::RefundedBy).integer())
                    .col(ColumnDef::new(Payments::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Payments::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_transaction")
                            .from(Payments::Table, Payments::TransactionId)
                            .to(ParkingTransactions::Table, ParkingTransactions::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Payments {
    Table,
    Id,
    TransactionId,
    PaymentTypeId,
    AmountCents,
    Currency,
    ReferenceNumber,
    Status,
    OperatorId,
    PaidAt,
    Notes,
    RefundAmountCents,
    RefundDate,
    RefundReason,
    RefundedBy,
    CreatedAt,
    UpdatedAt,
}
