//! Parking history entity
//!
//! Money columns hold integer minor units (hundredths).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parking_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub slot_id: i32,
    pub vehicle_number: String,
    pub user_email: String,
    pub user_phone: String,

    pub entry_time: i64,
    pub exit_time: i64,
    pub duration_minutes: i64,

    pub base_charge: i64,
    pub minute_charge: i64,
    pub total_amount: i64,

    /// PENDING or PAID
    pub payment_status: String,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
