//! Application services

pub mod history_ledger;
pub mod parking;
pub mod reservation_expiry;
pub mod slot_registry;

pub use history_ledger::HistoryLedger;
pub use parking::{ParkingService, Reservation, SensorReading};
pub use reservation_expiry::{start_reservation_expiry_task, ReservationExpiryPolicy};
pub use slot_registry::{CancelOutcome, ReserveCommand, Settlement, SlotRegistry};
