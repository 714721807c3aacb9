//! Create parking_transactions table
//!
//! Partial unique indexes keep at most one ACTIVE stay per vehicle and
//! per space.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

use super::m20240301_000001_create_facilities::{Spaces, Zones};
use super::m20240301_000002_create_customers::{Customers, Vehicles};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingTransactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingTransactions::VehicleId).integer().not_null())
                    .col(ColumnDef::new(ParkingTransactions::CustomerId).integer().not_null())
                    .col(ColumnDef::new(ParkingTransactions::ParkingId).integer().not_null())
                    .col(ColumnDef::new(ParkingTransactions::ZoneId).integer().not_null())
                    .col(ColumnDef::new(ParkingTransactions::SpaceId).integer().not_null())
                    .col(ColumnDef::new(ParkingTransactions::PlateNumber).string().not_null())
                    .col(ColumnDef::new(ParkingTransactions::EntryDocumentType).string().not_null())
                    .col(
                        ColumnDef::new(ParkingTransactions::EntryDocumentNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ParkingTransactions::ExitDocumentType).string())
                    .col(ColumnDef::new(ParkingTransactions::ExitDocumentNumber).string())
                    .col(
                        ColumnDef::new(ParkingTransactions::EntryTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ParkingTransactions::ExitTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(ParkingTransactions::DurationMinutes).big_integer())
                    .col(ColumnDef::new(ParkingTransactions::CalculatedAmountCents).big_integer())
                    .col(
                        ColumnDef::new(ParkingTransactions::DiscountAmountCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ParkingTransactions::TotalAmountCents).big_integer())
                    .col(ColumnDef::new(ParkingTransactions::Currency).string().not_null())
                    .col(ColumnDef::new(ParkingTransactions::RateIds).text())
                    .col(ColumnDef::new(ParkingTransactions::TariffBreakdown).text())
                    .col(
                        ColumnDef::new(ParkingTransactions::Status)
                            .string()
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(
                        ColumnDef::new(ParkingTransactions::PaymentStatus)
                            .string()
                            .not_null()
                            .default("UNPAID"),
                    )
                    .col(
                        ColumnDef::new(ParkingTransactions::EntryMethod)
                            .string()
                            .not_null()
                            .default("MANUAL"),
                    )
                    .col(ColumnDef::new(ParkingTransactions::EntryPhotoUrl).string())
                    .col(ColumnDef::new(ParkingTransactions::EntryPlateConfidence).double())
                    .col(ColumnDef::new(ParkingTransactions::ExitMethod).string())
                    .col(ColumnDef::new(ParkingTransactions::ExitPhotoUrl).string())
                    .col(ColumnDef::new(ParkingTransactions::ExitPlateConfidence).double())
                    .col(ColumnDef::new(ParkingTransactions::EntryOperatorId).integer().not_null())
                    .col(ColumnDef::new(ParkingTransactions::ExitOperatorId).integer())
                    .col(ColumnDef::new(ParkingTransactions::Notes).text())
                    .col(ColumnDef::new(ParkingTransactions::CancellationReason).string())
                    .col(ColumnDef::new(ParkingTransactions::CancelledBy).integer())
                    .col(
                        ColumnDef::new(ParkingTransactions::CancelledAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(ParkingTransactions::ReceiptSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ParkingTransactions::ReceiptSentAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(ColumnDef::new(ParkingTransactions::ReceiptEmailStatus).string())
                    .col(ColumnDef::new(ParkingTransactions::ReceiptWhatsappStatus).string())
                    .col(
                        ColumnDef::new(ParkingTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingTransactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_vehicle")
                            .from(ParkingTransactions::Table, ParkingTransactions::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_customer")
                            .from(ParkingTransactions::Table, ParkingTransactions::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_zone")
                            .from(ParkingTransactions::Table, ParkingTransactions::ZoneId)
                            .to(Zones::Table, Zones::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_space")
                            .from(ParkingTransactions::Table, ParkingTransactions::SpaceId)
                            .to(Spaces::Table, Spaces::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_status")
                    .table(ParkingTransactions::Table)
                    .col(ParkingTransactions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_plate")
                    .table(ParkingTransactions::Table)
                    .col(ParkingTransactions::PlateNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_entry_time")
                    .table(ParkingTransactions::Table)
                    .col(ParkingTransactions::EntryTime)
                    .to_owned(),
            )
            .await?;

        // sea-query has no builder for partial indexes.
        let db = manager.get_connection();
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS ux_parking_transactions_active_vehicle \
             ON parking_transactions (vehicle_id) WHERE status = 'ACTIVE'",
        )
        .await?;
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS ux_parking_transactions_active_space \
             ON parking_transactions (space_id) WHERE status = 'ACTIVE'",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingTransactions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingTransactions {
    Table,
    Id,
    VehicleId,
    CustomerId,
    ParkingId,
    ZoneId,
    SpaceId,
    PlateNumber,
    EntryDocumentType,
    EntryDocumentNumber,
    ExitDocumentType,
    ExitDocumentNumber,
    EntryTime,
    ExitTime,
    DurationMinutes,
    CalculatedAmountCents,
    DiscountAmountCents,
    TotalAmountCents,
    Currency,
    RateIds,
    TariffBreakdown,
    Status,
    PaymentStatus,
    EntryMethod,
    EntryPhotoUrl,
    EntryPlateConfidence,
    ExitMethod,
    ExitPhotoUrl,
    ExitPlateConfidence,
    EntryOperatorId,
    ExitOperatorId,
    Notes,
    CancellationReason,
    CancelledBy,
    CancelledAt,
    ReceiptSent,
    ReceiptSentAt,
    ReceiptEmailStatus,
    ReceiptWhatsappStatus,
    CreatedAt,
    UpdatedAt,
}
