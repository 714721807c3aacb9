//! Create parkings, zones and spaces tables

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Parkings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Parkings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Parkings::Name).string().not_null())
                    .col(
                        ColumnDef::new(Parkings::Status)
                            .string()
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(ColumnDef::new(Parkings::OpensAt).time())
                    .col(ColumnDef::new(Parkings::ClosesAt).time())
                    .col(
                        ColumnDef::new(Parkings::UtcOffsetMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Parkings::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Parkings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Parkings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Zones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Zones::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Zones::ParkingId).integer().not_null())
                    .col(ColumnDef::new(Zones::Name).string().not_null())
                    .col(
                        ColumnDef::new(Zones::Status)
                            .string()
                            .not_null()
                            .default("ACTIVE"),
                    )
                    .col(ColumnDef::new(Zones::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Zones::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Zones::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_zones_parking")
                            .from(Zones::Table, Zones::ParkingId)
                            .to(Parkings::Table, Parkings::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Spaces::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Spaces::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Spaces::ZoneId).integer().not_null())
                    .col(ColumnDef::new(Spaces::Code).string().not_null())
                    .col(
                        ColumnDef::new(Spaces::Status)
                            .string()
                            .not_null()
                            .default("AVAILABLE"),
                    )
                    .col(
                        ColumnDef::new(Spaces::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Spaces::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Spaces::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_spaces_zone")
                            .from(Spaces::Table, Spaces::ZoneId)
                            .to(Zones::Table, Zones::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_spaces_zone_status")
                    .table(Spaces::Table)
                    .col(Spaces::ZoneId)
                    .col(Spaces::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Spaces::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Zones::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Parkings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Parkings {
    Table,
    Id,
    Name,
    Status,
    OpensAt,
    ClosesAt,
    UtcOffsetMinutes,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Zones {
    Table,
    Id,
    ParkingId,
    Name,
    Status,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Spaces {
    Table,
    Id,
    ZoneId,
    Code,
    Status,
    Version,
    CreatedAt,
    UpdatedAt,
}
