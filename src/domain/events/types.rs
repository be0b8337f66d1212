//! Notification events
//!
//! Defines all event types that can be broadcasted to subscribers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::billing::{BillingBreakdown, Money};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    ReservationConfirmed(ReservationConfirmedEvent),
    ReservationCancelled(ReservationCancelledEvent),
    ReservationExpired(SlotEvent),
    OccupancyStarted(OccupancyStartedEvent),
    BillGenerated(BillGeneratedEvent),
    PaymentConfirmed(PaymentConfirmedEvent),
    SlotReset(SlotEvent),
    HistoryCleared(HistoryClearedEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ReservationConfirmed(_) => "reservation_confirmed",
            Event::ReservationCancelled(_) => "reservation_cancelled",
            Event::ReservationExpired(_) => "reservation_expired",
            Event::OccupancyStarted(_) => "occupancy_started",
            Event::BillGenerated(_) => "bill_generated",
            Event::PaymentConfirmed(_) => "payment_confirmed",
            Event::SlotReset(_) => "slot_reset",
            Event::HistoryCleared(_) => "history_cleared",
        }
    }

    pub fn slot_id(&self) -> Option<i32> {
        match self {
            Event::ReservationConfirmed(e) => Some(e.slot_id),
            Event::ReservationCancelled(e) => Some(e.slot_id),
            Event::ReservationExpired(e) => Some(e.slot_id),
            Event::OccupancyStarted(e) => Some(e.slot_id),
            Event::BillGenerated(e) => Some(e.slot_id),
            Event::PaymentConfirmed(e) => Some(e.slot_id),
            Event::SlotReset(e) => Some(e.slot_id),
            Event::HistoryCleared(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfirmedEvent {
    pub slot_id: i32,
    pub vehicle_number: String,
    pub user_email: String,
    pub user_phone: String,
    pub arrival_time: i64,
    pub duration_hours: Decimal,
    pub quoted_charge: Money,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCancelledEvent {
    pub slot_id: i32,
    pub user_email: String,
    /// Set when the cancelled reservation had already turned into usage
    pub history_id: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotEvent {
    pub slot_id: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupancyStartedEvent {
    pub slot_id: i32,
    pub entry_time: i64,
    pub vehicle_number: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Everything a receipt needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillGeneratedEvent {
    pub slot_id: i32,
    pub history_id: i32,
    pub vehicle_number: String,
    pub user_email: String,
    pub user_phone: String,
    pub breakdown: BillingBreakdown,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmedEvent {
    pub slot_id: i32,
    pub history_id: i32,
    pub total_amount: Money,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryClearedEvent {
    pub removed: u64,
    pub timestamp: DateTime<Utc>,
}

/// Envelope delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
