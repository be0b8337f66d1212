//! Domain events
//!
//! Emitted after a slot or ledger transition commits. Delivery channels
//! (email receipts, SMS, dashboards) subscribe to these; the core never
//! sends anything itself.

pub mod types;

pub use types::*;
