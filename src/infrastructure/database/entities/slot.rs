//! Parking slot entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "slots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub slot_id: i32,

    /// AVAILABLE, RESERVED or OCCUPIED
    pub state: String,

    #[sea_orm(nullable)]
    pub vehicle_number: Option<String>,
    #[sea_orm(nullable)]
    pub user_email: Option<String>,
    #[sea_orm(nullable)]
    pub user_phone: Option<String>,

    /// Epoch seconds; set only while OCCUPIED
    #[sea_orm(nullable)]
    pub entry_time: Option<i64>,

    /// Epoch seconds; set only while RESERVED
    #[sea_orm(nullable)]
    pub arrival_time: Option<i64>,
    /// Decimal hours, stored as text to keep it exact
    #[sea_orm(nullable)]
    pub reserved_duration_hours: Option<String>,

    pub from_reservation: bool,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
