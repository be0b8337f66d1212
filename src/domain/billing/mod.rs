//! Billing calculator
//!
//! The single place where parking charges are derived. Two formulas live
//! here and are deliberately kept apart:
//!
//! - [`compute`]: settlement charge for an actual occupancy interval,
//!   a fixed base charge plus a per-30-second rate over whole minutes.
//! - [`reservation_quote`]: advance estimate shown at booking time,
//!   an hourly rate plus the same base charge.
//!
//! The two are not reconciled against each other.

mod calculator;
mod model;

pub use calculator::{
    check_reservation_hours, compute, reservation_quote, BASE_CHARGE, INTERVAL_SECONDS,
    MAX_RESERVATION_HOURS, RATE_PER_INTERVAL, RESERVATION_RATE_PER_HOUR,
};
pub use model::{from_minor_units, to_minor_units, BillingBreakdown, Money};
