//! Slot aggregate
//!
//! Contains the Slot entity, its lifecycle state machine, and the
//! repository interface.

pub mod model;
pub mod repository;

pub use model::{ContactInfo, Occupancy, ReservationWindow, Slot, SlotState};
pub use repository::SlotRepository;
