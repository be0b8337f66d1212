//! Database entities module

pub mod history_record;
pub mod slot;

pub use history_record::Entity as HistoryRecord;
pub use slot::Entity as Slot;
