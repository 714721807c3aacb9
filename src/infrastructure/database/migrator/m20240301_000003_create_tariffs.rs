//! Create shifts, rates and shift_rate_assignments tables
//!
//! A parking bills each shift at the rate assigned to the
//! `(parking_id, shift_id)` pair.

use sea_orm_migration::prelude::*;

use super::m20240301_000001_create_facilities::Parkings;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shifts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Shifts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Shifts::ParkingId).integer())
                    .col(ColumnDef::new(Shifts::Code).string().not_null())
                    .col(ColumnDef::new(Shifts::Name).string().not_null())
                    .col(ColumnDef::new(Shifts::StartTime).time().not_null())
                    .col(ColumnDef::new(Shifts::EndTime).time().not_null())
                    .col(
                        ColumnDef::new(Shifts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Shifts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Rates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rates::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rates::Name).string().not_null())
                    .col(ColumnDef::new(Rates::AmountCents).big_integer().not_null())
                    .col(
                        ColumnDef::new(Rates::Currency)
                            .string()
                            .not_null()
                            .default("PEN"),
                    )
                    .col(
                        ColumnDef::new(Rates::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Rates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ShiftRateAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShiftRateAssignments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ShiftRateAssignments::ParkingId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShiftRateAssignments::ShiftId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShiftRateAssignments::RateId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShiftRateAssignments::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ShiftRateAssignments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignments_parking")
                            .from(ShiftRateAssignments::Table, ShiftRateAssignments::ParkingId)
                            .to(Parkings::Table, Parkings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignments_shift")
                            .from(ShiftRateAssignments::Table, ShiftRateAssignments::ShiftId)
                            .to(Shifts::Table, Shifts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignments_rate")
                            .from(ShiftRateAssignments::Table, ShiftRateAssignments::RateId)
                            .to(Rates::Table, Rates::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_assignments_parking_shift")
                    .table(ShiftRateAssignments::Table)
                    .col(ShiftRateAssignments::ParkingId)
                    .col(ShiftRateAssignments::ShiftId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ShiftRateAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Rates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shifts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Shifts {
    Table,
    Id,
    ParkingId,
    Code,
    Name,
    StartTime,
    EndTime,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
pub enum Rates {
    Table,
    Id,
    Name,
    AmountCents,
    Currency,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
pub enum ShiftRateAssignments {
    Table,
    Id,
    ParkingId,
    ShiftId,
    RateId,
    IsActive,
    CreatedAt,
}
