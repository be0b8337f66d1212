//! Domain layer: entities, state machine, billing rules and repository
//! contracts. No I/O happens here.

pub mod billing;
pub mod events;
pub mod history;
pub mod repositories;
pub mod slot;

pub use billing::{BillingBreakdown, Money};
pub use history::{CompletedSession, HistoryRecord, PaymentStatus, RevenueStats};
pub use repositories::{DomainResult, RepositoryProvider};
pub use slot::{ContactInfo, Occupancy, ReservationWindow, Slot, SlotState};

pub use crate::shared::errors::DomainError;
