//! History aggregate
//!
//! Completed parking sessions and their payment status.

pub mod model;
pub mod repository;

pub use model::{CompletedSession, HistoryRecord, PaymentStatus, RevenueStats};
pub use repository::HistoryRepository;
