//! In-memory storage implementation

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::domain::history::HistoryRepository;
use crate::domain::slot::SlotRepository;
use crate::domain::{
    CompletedSession, DomainError, DomainResult, HistoryRecord, PaymentStatus,
    RepositoryProvider, Slot,
};

/// In-memory slot table for development and testing
#[derive(Default)]
pub struct InMemorySlotRepository {
    slots: DashMap<i32, Slot>,
}

impl InMemorySlotRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn find_all(&self) -> DomainResult<Vec<Slot>> {
        let mut slots: Vec<Slot> = self.slots.iter().map(|e| e.value().clone()).collect();
        slots.sort_by_key(|s| s.slot_id());
        Ok(slots)
    }

    async fn find_by_id(&self, slot_id: i32) -> DomainResult<Option<Slot>> {
        Ok(self.slots.get(&slot_id).map(|e| e.value().clone()))
    }

    async fn insert_if_absent(&self, slot: Slot) -> DomainResult<bool> {
        match self.slots.entry(slot.slot_id()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(slot);
                Ok(true)
            }
        }
    }

    async fn update(&self, slot: &Slot) -> DomainResult<()> {
        match self.slots.get_mut(&slot.slot_id()) {
            Some(mut stored) => {
                *stored = slot.clone();
                Ok(())
            }
            None => Err(DomainError::UnknownSlot(slot.slot_id())),
        }
    }
}

/// In-memory parking history
pub struct InMemoryHistoryRepository {
    records: DashMap<i32, HistoryRecord>,
    id_counter: AtomicI32,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            id_counter: AtomicI32::new(1),
        }
    }

    fn sorted_desc(&self, status: Option<PaymentStatus>) -> Vec<HistoryRecord> {
        let mut records: Vec<HistoryRecord> = self
            .records
            .iter()
            .filter(|e| status.map_or(true, |s| e.value().payment_status == s))
            .map(|e| e.value().clone())
            .collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        records
    }
}

impl Default for InMemoryHistoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn append(&self, session: CompletedSession) -> DomainResult<HistoryRecord> {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        let record = HistoryRecord::from_session(id, session, Utc::now());
        self.records.insert(id, record.clone());
        Ok(record)
    }

    async fn find_recent(&self, limit: u64) -> DomainResult<Vec<HistoryRecord>> {
        let mut records = self.sorted_desc(None);
        records.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(records)
    }

    async fn find_by_status(&self, status: PaymentStatus) -> DomainResult<Vec<HistoryRecord>> {
        Ok(self.sorted_desc(Some(status)))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<HistoryRecord>> {
        Ok(self.records.get(&id).map(|e| e.value().clone()))
    }

    async fn mark_paid(&self, id: i32) -> DomainResult<HistoryRecord> {
        // The shard write lock held by `get_mut` makes this a single-row CAS.
        let mut record = self
            .records
            .get_mut(&id)
            .ok_or_else(|| DomainError::history_not_found(id))?;
        record.mark_paid()?;
        Ok(record.clone())
    }

    async fn clear_all(&self) -> DomainResult<u64> {
        let removed = self.records.len() as u64;
        self.records.clear();
        Ok(removed)
    }
}

/// In-memory `RepositoryProvider`
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    slots: InMemorySlotRepository,
    history: InMemoryHistoryRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryRepositoryProvider {
    fn slots(&self) -> &dyn SlotRepository {
        &self.slots
    }

    fn history(&self) -> &dyn HistoryRepository {
        &self.history
    }

    async fn settle(&self, slot: &Slot, session: CompletedSession) -> DomainResult<HistoryRecord> {
        let record = self.history.append(session).await?;
        if let Err(e) = self.slots.update(slot).await {
            // Ids stay consumed; only the row is withdrawn.
            self.history.records.remove(&record.id);
            return Err(e);
        }
        Ok(record)
    }
}
