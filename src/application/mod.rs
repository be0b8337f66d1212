//! Application layer: use cases over the domain

pub mod events;
pub mod services;

pub use events::{create_event_bus, Event, EventBus, EventSubscriber, SharedEventBus};
pub use services::{
    start_reservation_expiry_task, CancelOutcome, HistoryLedger, ParkingService, Reservation,
    ReservationExpiryPolicy, ReserveCommand, SensorReading, Settlement, SlotRegistry,
};
