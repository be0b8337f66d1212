//! Slot DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::application::{CancelOutcome, Reservation, Settlement};
use crate::domain::billing::MAX_RESERVATION_HOURS;
use crate::domain::{BillingBreakdown, ContactInfo, Slot, SlotState};

fn validate_duration_hours(hours: &Decimal) -> Result<(), ValidationError> {
    if *hours <= Decimal::ZERO || *hours > Decimal::from(MAX_RESERVATION_HOURS) {
        return Err(ValidationError::new("duration_hours_out_of_range"));
    }
    Ok(())
}

/// Slot as shown to clients
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlotDto {
    pub slot_id: i32,
    /// AVAILABLE, RESERVED or OCCUPIED
    pub state: String,
    pub vehicle_number: Option<String>,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
    /// Epoch seconds, set while OCCUPIED
    pub entry_time: Option<i64>,
    /// Epoch seconds, set while RESERVED
    pub arrival_time: Option<i64>,
    #[schema(value_type = Option<String>)]
    pub duration_hours: Option<Decimal>,
    /// Epoch second after which an unused reservation lapses
    pub reservation_expires_at: Option<i64>,
}

impl From<&Slot> for SlotDto {
    fn from(slot: &Slot) -> Self {
        let contact = slot.contact();
        let window = slot.reservation();
        Self {
            slot_id: slot.slot_id(),
            state: slot.state().as_str().to_string(),
            vehicle_number: contact.map(|c| c.vehicle_number.clone()),
            user_email: contact.map(|c| c.user_email.clone()),
            user_phone: contact.map(|c| c.user_phone.clone()),
            entry_time: slot.entry_time(),
            arrival_time: window.map(|w| w.arrival_time),
            duration_hours: window.map(|w| w.duration_hours),
            reservation_expires_at: window.map(|w| w.expires_at()),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReserveSlotRequest {
    #[validate(range(min = 1))]
    pub slot_id: i32,
    #[validate(length(min = 1, max = 20))]
    pub vehicle_number: String,
    #[validate(email)]
    pub user_email: String,
    #[validate(length(min = 5, max = 20))]
    pub user_phone: String,
    /// Expected arrival (epoch seconds). Defaults to now.
    pub arrival_time: Option<i64>,
    /// Between 0 (exclusive) and 8760 hours
    #[schema(value_type = String, example = "2")]
    #[validate(custom(function = "validate_duration_hours"))]
    pub duration_hours: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReserveSlotResponse {
    pub slot: SlotDto,
    #[schema(value_type = String)]
    pub reservation_charge: Decimal,
}

impl From<Reservation> for ReserveSlotResponse {
    fn from(r: Reservation) -> Self {
        Self {
            slot: SlotDto::from(&r.slot),
            reservation_charge: r.quoted_charge,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CancelReservationRequest {
    pub slot_id: i32,
    #[validate(email)]
    pub confirm_email: String,
}

/// Bill for one settled session
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BillDto {
    pub history_id: i32,
    pub slot_id: i32,
    pub entry_time: i64,
    pub exit_time: i64,
    pub duration_minutes: i64,
    #[schema(value_type = String)]
    pub base_charge: Decimal,
    #[schema(value_type = String)]
    pub minute_charge: Decimal,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
}

impl BillDto {
    pub fn new(history_id: i32, slot_id: i32, b: &BillingBreakdown) -> Self {
        Self {
            history_id,
            slot_id,
            entry_time: b.entry_time,
            exit_time: b.exit_time,
            duration_minutes: b.duration_minutes,
            base_charge: b.base_charge,
            minute_charge: b.minute_charge,
            total_amount: b.total_amount,
        }
    }
}

impl From<&Settlement> for BillDto {
    fn from(s: &Settlement) -> Self {
        Self::new(s.history_id, s.slot_id, &s.breakdown)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelReservationResponse {
    pub slot_id: i32,
    /// FREED when the reservation was unused, SETTLED when the stay was billed
    pub outcome: String,
    pub bill: Option<BillDto>,
}

impl From<CancelOutcome> for CancelReservationResponse {
    fn from(outcome: CancelOutcome) -> Self {
        match outcome {
            CancelOutcome::Freed { slot_id } => Self {
                slot_id,
                outcome: "FREED".to_string(),
                bill: None,
            },
            CancelOutcome::Settled(settlement) => Self {
                slot_id: settlement.slot_id,
                outcome: "SETTLED".to_string(),
                bill: Some(BillDto::from(&settlement)),
            },
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PayBillRequest {
    #[validate(length(min = 1, max = 20))]
    pub vehicle_number: String,
    #[validate(email)]
    pub user_email: String,
    #[validate(length(min = 5, max = 20))]
    pub user_phone: String,
}

impl From<PayBillRequest> for ContactInfo {
    fn from(r: PayBillRequest) -> Self {
        ContactInfo::new(r.vehicle_number, r.user_email, r.user_phone)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResetSlotResponse {
    pub slot_id: i32,
    pub previous_state: String,
}

impl ResetSlotResponse {
    pub fn new(slot_id: i32, previous: SlotState) -> Self {
        Self {
            slot_id,
            previous_state: previous.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResetAllResponse {
    /// Slots that were not already AVAILABLE
    pub reset: usize,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuoteQuery {
    /// Requested reservation length in hours
    #[param(value_type = String)]
    pub duration_hours: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuoteResponse {
    #[schema(value_type = String)]
    pub duration_hours: Decimal,
    #[schema(value_type = String)]
    pub reservation_charge: Decimal,
}
