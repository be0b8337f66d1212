//! Slot domain entity and lifecycle state machine

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::billing;
use crate::domain::history::CompletedSession;
use crate::shared::errors::{DomainError, DomainResult};

/// Externally visible slot state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotState {
    Available,
    Reserved,
    Occupied,
}

impl SlotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Reserved => "RESERVED",
            Self::Occupied => "OCCUPIED",
        }
    }
}

impl std::str::FromStr for SlotState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(Self::Available),
            "RESERVED" => Ok(Self::Reserved),
            "OCCUPIED" => Ok(Self::Occupied),
            other => Err(DomainError::Validation(format!("unknown slot state {}", other))),
        }
    }
}

impl std::fmt::Display for SlotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who is holding or using a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub vehicle_number: String,
    pub user_email: String,
    pub user_phone: String,
}

impl ContactInfo {
    pub fn new(
        vehicle_number: impl Into<String>,
        user_email: impl Into<String>,
        user_phone: impl Into<String>,
    ) -> Self {
        Self {
            vehicle_number: vehicle_number.into(),
            user_email: user_email.into(),
            user_phone: user_phone.into(),
        }
    }
}

/// Booked arrival window of a reservation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationWindow {
    /// Expected arrival (epoch seconds)
    pub arrival_time: i64,
    pub duration_hours: Decimal,
}

impl ReservationWindow {
    /// Epoch second at which an unused reservation lapses
    pub fn expires_at(&self) -> i64 {
        let seconds = self
            .duration_hours
            .checked_mul(Decimal::from(3_600))
            .and_then(|s| s.trunc().to_i64())
            .unwrap_or(i64::MAX);
        self.arrival_time.saturating_add(seconds)
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at()
    }
}

/// Slot lifecycle. Each variant carries exactly the fields that are
/// meaningful in that state, so "reserved and occupied at once" or
/// "available with an entry time" cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupancy {
    Available,
    Reserved {
        contact: ContactInfo,
        window: ReservationWindow,
    },
    Occupied {
        /// Unknown until payment when the vehicle was detected by a sensor
        /// without a prior reservation.
        contact: Option<ContactInfo>,
        entry_time: i64,
        /// Occupancy began while the slot was held by a reservation
        from_reservation: bool,
    },
}

/// A physical parking slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    slot_id: i32,
    occupancy: Occupancy,
}

impl Slot {
    /// Provision a new slot in the AVAILABLE state
    pub fn new(slot_id: i32) -> Self {
        Self {
            slot_id,
            occupancy: Occupancy::Available,
        }
    }

    /// Rebuild a slot from persisted state
    pub fn restore(slot_id: i32, occupancy: Occupancy) -> Self {
        Self { slot_id, occupancy }
    }

    pub fn slot_id(&self) -> i32 {
        self.slot_id
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn state(&self) -> SlotState {
        match self.occupancy {
            Occupancy::Available => SlotState::Available,
            Occupancy::Reserved { .. } => SlotState::Reserved,
            Occupancy::Occupied { .. } => SlotState::Occupied,
        }
    }

    pub fn is_available(&self) -> bool {
        self.state() == SlotState::Available
    }

    pub fn contact(&self) -> Option<&ContactInfo> {
        match &self.occupancy {
            Occupancy::Available => None,
            Occupancy::Reserved { contact, .. } => Some(contact),
            Occupancy::Occupied { contact, .. } => contact.as_ref(),
        }
    }

    pub fn entry_time(&self) -> Option<i64> {
        match self.occupancy {
            Occupancy::Occupied { entry_time, .. } => Some(entry_time),
            _ => None,
        }
    }

    pub fn reservation(&self) -> Option<&ReservationWindow> {
        match &self.occupancy {
            Occupancy::Reserved { window, .. } => Some(window),
            _ => None,
        }
    }

    // ── Transitions ────────────────────────────────────────────
    //
    // Each transition either applies fully or returns an error without
    // touching `self`.

    /// AVAILABLE → RESERVED
    pub fn reserve(&mut self, contact: ContactInfo, window: ReservationWindow) -> DomainResult<()> {
        if !self.is_available() {
            return Err(DomainError::SlotUnavailable(self.slot_id));
        }
        self.occupancy = Occupancy::Reserved { contact, window };
        Ok(())
    }

    /// AVAILABLE | RESERVED → OCCUPIED, entry at `now`
    pub fn begin_occupancy(&mut self, now: i64) -> DomainResult<()> {
        let next = match &self.occupancy {
            Occupancy::Available => Occupancy::Occupied {
                contact: None,
                entry_time: now,
                from_reservation: false,
            },
            Occupancy::Reserved { contact, .. } => Occupancy::Occupied {
                contact: Some(contact.clone()),
                entry_time: now,
                from_reservation: true,
            },
            Occupancy::Occupied { .. } => return Err(DomainError::SlotUnavailable(self.slot_id)),
        };
        self.occupancy = next;
        Ok(())
    }

    /// Cancel the reservation held by `confirm_email`.
    ///
    /// A plain reservation is released without charge (`Ok(None)`). When the
    /// reserved vehicle has already arrived, the session is settled as a
    /// regular bill and returned.
    pub fn cancel_reservation(
        &mut self,
        confirm_email: &str,
        now: i64,
    ) -> DomainResult<Option<CompletedSession>> {
        match &self.occupancy {
            Occupancy::Reserved { contact, .. } => {
                if contact.user_email != confirm_email {
                    return Err(DomainError::EmailMismatch(self.slot_id));
                }
                self.occupancy = Occupancy::Available;
                Ok(None)
            }
            Occupancy::Occupied {
                contact: Some(contact),
                from_reservation: true,
                ..
            } => {
                if contact.user_email != confirm_email {
                    return Err(DomainError::EmailMismatch(self.slot_id));
                }
                let contact = contact.clone();
                self.settle(contact, now).map(Some)
            }
            _ => Err(DomainError::SlotNotReserved(self.slot_id)),
        }
    }

    /// OCCUPIED → AVAILABLE, billing `[entry_time, now]` to `contact`
    pub fn pay_bill(&mut self, contact: ContactInfo, now: i64) -> DomainResult<CompletedSession> {
        if self.state() != SlotState::Occupied {
            return Err(DomainError::SlotNotOccupied(self.slot_id));
        }
        self.settle(contact, now)
    }

    /// Force back to AVAILABLE. Returns the state that was discarded.
    pub fn reset(&mut self) -> SlotState {
        let previous = self.state();
        self.occupancy = Occupancy::Available;
        previous
    }

    /// RESERVED → AVAILABLE if the reservation window has lapsed at `now`
    pub fn expire_reservation(&mut self, now: i64) -> bool {
        match &self.occupancy {
            Occupancy::Reserved { window, .. } if window.is_expired(now) => {
                self.occupancy = Occupancy::Available;
                true
            }
            _ => false,
        }
    }

    fn settle(&mut self, contact: ContactInfo, now: i64) -> DomainResult<CompletedSession> {
        let entry_time = self
            .entry_time()
            .ok_or(DomainError::SlotNotOccupied(self.slot_id))?;
        let breakdown = billing::compute(entry_time, now)?;
        self.occupancy = Occupancy::Available;
        Ok(CompletedSession {
            slot_id: self.slot_id,
            contact,
            breakdown,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────
