//! Storage implementations

pub mod memory;

pub use memory::{InMemoryHistoryRepository, InMemoryRepositoryProvider, InMemorySlotRepository};
