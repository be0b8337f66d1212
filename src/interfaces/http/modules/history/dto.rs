//! History DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{HistoryRecord, RevenueStats};

pub const DEFAULT_HISTORY_LIMIT: u64 = 50;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Maximum number of records (default 50)
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryRecordDto {
    pub id: i32,
    pub slot_id: i32,
    pub vehicle_number: String,
    pub user_email: String,
    pub user_phone: String,
    pub entry_time: i64,
    pub exit_time: i64,
    pub duration_minutes: i64,
    #[schema(value_type = String)]
    pub base_charge: Decimal,
    #[schema(value_type = String)]
    pub minute_charge: Decimal,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    /// PENDING or PAID
    pub payment_status: String,
    pub created_at: String,
}

impl From<HistoryRecord> for HistoryRecordDto {
    fn from(r: HistoryRecord) -> Self {
        Self {
            id: r.id,
            slot_id: r.slot_id,
            vehicle_number: r.vehicle_number,
            user_email: r.user_email,
            user_phone: r.user_phone,
            entry_time: r.entry_time,
            exit_time: r.exit_time,
            duration_minutes: r.duration_minutes,
            base_charge: r.base_charge,
            minute_charge: r.minute_charge,
            total_amount: r.total_amount,
            payment_status: r.payment_status.as_str().to_string(),
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevenueDto {
    #[schema(value_type = String)]
    pub total_revenue: Decimal,
    pub total_sessions: u64,
}

impl From<RevenueStats> for RevenueDto {
    fn from(s: RevenueStats) -> Self {
        Self {
            total_revenue: s.total_revenue,
            total_sessions: s.total_sessions,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClearHistoryResponse {
    pub removed: u64,
}
