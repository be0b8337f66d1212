//! Slot repository interface

use async_trait::async_trait;

use super::model::Slot;
use crate::domain::DomainResult;

#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// All slots ordered by slot id
    async fn find_all(&self) -> DomainResult<Vec<Slot>>;

    async fn find_by_id(&self, slot_id: i32) -> DomainResult<Option<Slot>>;

    /// Insert a freshly provisioned slot. Returns false if the id exists,
    /// in which case the stored slot is left untouched.
    async fn insert_if_absent(&self, slot: Slot) -> DomainResult<bool>;

    /// Persist the current state of an existing slot
    async fn update(&self, slot: &Slot) -> DomainResult<()>;
}
