//! Create parking_history table
//!
//! `id` is AUTOINCREMENT so ids stay monotonic even after the table is
//! cleared.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingHistory::SlotId).integer().not_null())
                    .col(
                        ColumnDef::new(ParkingHistory::VehicleNumber)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ParkingHistory::UserEmail).string().not_null())
                    .col(ColumnDef::new(ParkingHistory::UserPhone).string().not_null())
                    .col(
                        ColumnDef::new(ParkingHistory::EntryTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingHistory::ExitTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingHistory::DurationMinutes)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingHistory::BaseCharge)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingHistory::MinuteCharge)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingHistory::TotalAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingHistory::PaymentStatus)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(ParkingHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_history_payment_status")
                    .table(ParkingHistory::Table)
                    .col(ParkingHistory::PaymentStatus)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_history_slot")
                    .table(ParkingHistory::Table)
                    .col(ParkingHistory::SlotId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingHistory {
    Table,
    Id,
    SlotId,
    VehicleNumber,
    UserEmail,
    UserPhone,
    EntryTime,
    ExitTime,
    DurationMinutes,
    BaseCharge,
    MinuteCharge,
    TotalAmount,
    PaymentStatus,
    CreatedAt,
}
