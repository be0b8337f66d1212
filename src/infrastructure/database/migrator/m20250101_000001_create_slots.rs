//! Create slots table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Slots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Slots::SlotId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Slots::State)
                            .string_len(16)
                            .not_null()
                            .default("AVAILABLE"),
                    )
                    .col(ColumnDef::new(Slots::VehicleNumber).string())
                    .col(ColumnDef::new(Slots::UserEmail).string())
                    .col(ColumnDef::new(Slots::UserPhone).string())
                    .col(ColumnDef::new(Slots::EntryTime).big_integer())
                    .col(ColumnDef::new(Slots::ArrivalTime).big_integer())
                    .col(ColumnDef::new(Slots::ReservedDurationHours).string())
                    .col(
                        ColumnDef::new(Slots::FromReservation)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Slots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Slots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Slots {
    Table,
    SlotId,
    State,
    VehicleNumber,
    UserEmail,
    UserPhone,
    EntryTime,
    ArrivalTime,
    ReservedDurationHours,
    FromReservation,
    UpdatedAt,
}
