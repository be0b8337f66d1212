//! Slot registry: the single owner of slot state transitions.
//!
//! Every mutation of a slot runs under that slot's own async mutex, so two
//! requests for the same slot are serialized while different slots proceed
//! in parallel. The transition is applied to a copy of the slot and only
//! persisted once billing has succeeded. Settlements write the history
//! record and the freed slot in one unit of work, so a failed operation
//! leaves both untouched.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use super::history_ledger::HistoryLedger;
use crate::domain::billing;
use crate::domain::{
    BillingBreakdown, ContactInfo, DomainError, DomainResult, RepositoryProvider,
    ReservationWindow, Slot, SlotState,
};
use crate::shared::time::SharedClock;

/// Input to `SlotRegistry::reserve`
#[derive(Debug, Clone)]
pub struct ReserveCommand {
    pub slot_id: i32,
    pub contact: ContactInfo,
    /// Defaults to now when absent
    pub arrival_time: Option<i64>,
    pub duration_hours: Decimal,
}

/// A session settled into the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub history_id: i32,
    pub slot_id: i32,
    pub contact: ContactInfo,
    pub breakdown: BillingBreakdown,
}

/// Result of cancelling a reservation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The reservation was never used; the slot is free again
    Freed { slot_id: i32 },
    /// The reserved vehicle had already arrived; the stay was billed
    Settled(Settlement),
}

pub struct SlotRegistry {
    repos: Arc<dyn RepositoryProvider>,
    ledger: Arc<HistoryLedger>,
    clock: SharedClock,
    locks: DashMap<i32, Arc<Mutex<()>>>,
}

impl SlotRegistry {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        ledger: Arc<HistoryLedger>,
        clock: SharedClock,
    ) -> Self {
        Self {
            repos,
            ledger,
            clock,
            locks: DashMap::new(),
        }
    }

    /// Create the given slots as AVAILABLE; existing slots are left alone.
    /// Returns how many were created.
    pub async fn provision(&self, slot_ids: &[i32]) -> DomainResult<usize> {
        let mut created = 0;
        for &slot_id in slot_ids {
            if self.repos.slots().insert_if_absent(Slot::new(slot_id)).await? {
                debug!(slot_id, "Slot provisioned");
                created += 1;
            }
        }
        Ok(created)
    }

    pub async fn list(&self) -> DomainResult<Vec<Slot>> {
        self.repos.slots().find_all().await
    }

    pub async fn get(&self, slot_id: i32) -> DomainResult<Slot> {
        self.repos
            .slots()
            .find_by_id(slot_id)
            .await?
            .ok_or(DomainError::UnknownSlot(slot_id))
    }

    pub async fn reserve(&self, cmd: ReserveCommand) -> DomainResult<Slot> {
        if cmd.duration_hours <= Decimal::ZERO {
            return Err(DomainError::Validation(
                "duration_hours must be positive".to_string(),
            ));
        }
        billing::check_reservation_hours(cmd.duration_hours)?;
        let now = self.clock.now();
        let arrival_time = cmd.arrival_time.unwrap_or(now);
        if arrival_time < now {
            return Err(DomainError::Validation(
                "arrival_time cannot be in the past".to_string(),
            ));
        }

        let (_guard, mut slot) = self.lock_slot(cmd.slot_id).await?;
        slot.reserve(
            cmd.contact,
            ReservationWindow {
                arrival_time,
                duration_hours: cmd.duration_hours,
            },
        )?;
        self.repos.slots().update(&slot).await?;

        info!(slot_id = cmd.slot_id, arrival_time, "🅿️ Slot reserved");
        Ok(slot)
    }

    pub async fn begin_occupancy(&self, slot_id: i32) -> DomainResult<Slot> {
        let (_guard, mut slot) = self.lock_slot(slot_id).await?;
        slot.begin_occupancy(self.clock.now())?;
        self.repos.slots().update(&slot).await?;

        info!(slot_id, entry_time = ?slot.entry_time(), "🚗 Occupancy started");
        Ok(slot)
    }

    /// Begin occupancy unless the slot is already OCCUPIED.
    /// Returns the updated slot only when a transition happened.
    pub async fn occupy_if_vacant(&self, slot_id: i32) -> DomainResult<Option<Slot>> {
        let (_guard, mut slot) = self.lock_slot(slot_id).await?;
        if slot.state() == SlotState::Occupied {
            return Ok(None);
        }
        slot.begin_occupancy(self.clock.now())?;
        self.repos.slots().update(&slot).await?;

        info!(slot_id, entry_time = ?slot.entry_time(), "🚗 Occupancy detected");
        Ok(Some(slot))
    }

    pub async fn cancel_reservation(
        &self,
        slot_id: i32,
        confirm_email: &str,
    ) -> DomainResult<CancelOutcome> {
        let (_guard, slot) = self.lock_slot(slot_id).await?;
        let mut next = slot.clone();

        match next.cancel_reservation(confirm_email, self.clock.now())? {
            None => {
                self.repos.slots().update(&next).await?;
                info!(slot_id, "❎ Reservation cancelled");
                Ok(CancelOutcome::Freed { slot_id })
            }
            Some(session) => {
                let contact = session.contact.clone();
                let breakdown = session.breakdown.clone();
                let record = self.ledger.settle(&next, session).await?;

                info!(
                    slot_id,
                    history_id = record.id,
                    total_amount = %breakdown.total_amount,
                    "❎ Reservation cancelled after arrival, stay billed"
                );
                Ok(CancelOutcome::Settled(Settlement {
                    history_id: record.id,
                    slot_id,
                    contact,
                    breakdown,
                }))
            }
        }
    }

    pub async fn pay_bill(&self, slot_id: i32, contact: ContactInfo) -> DomainResult<Settlement> {
        let (_guard, slot) = self.lock_slot(slot_id).await?;
        let mut next = slot.clone();

        let session = next.pay_bill(contact, self.clock.now())?;
        let contact = session.contact.clone();
        let breakdown = session.breakdown.clone();
        let record = self.ledger.settle(&next, session).await?;

        info!(
            slot_id,
            history_id = record.id,
            duration_minutes = breakdown.duration_minutes,
            total_amount = %breakdown.total_amount,
            "💳 Bill generated"
        );
        Ok(Settlement {
            history_id: record.id,
            slot_id,
            contact,
            breakdown,
        })
    }

    /// Force a slot back to AVAILABLE without recording anything.
    /// Returns the state that was discarded.
    pub async fn reset(&self, slot_id: i32) -> DomainResult<SlotState> {
        let (_guard, mut slot) = self.lock_slot(slot_id).await?;
        let previous = slot.reset();
        if previous != SlotState::Available {
            self.repos.slots().update(&slot).await?;
        }

        info!(slot_id, previous = %previous, "🔄 Slot reset");
        Ok(previous)
    }

    /// Reset every slot. Returns the ids of slots that were not already AVAILABLE.
    pub async fn reset_all(&self) -> DomainResult<Vec<i32>> {
        let mut changed = Vec::new();
        for slot in self.list().await? {
            if self.reset(slot.slot_id()).await? != SlotState::Available {
                changed.push(slot.slot_id());
            }
        }
        Ok(changed)
    }

    /// Free the slot if it holds a reservation that lapsed at `now`
    pub async fn expire_if_stale(&self, slot_id: i32, now: i64) -> DomainResult<bool> {
        let (_guard, mut slot) = self.lock_slot(slot_id).await?;
        if !slot.expire_reservation(now) {
            return Ok(false);
        }
        self.repos.slots().update(&slot).await?;

        info!(slot_id, "⌛ Reservation expired");
        Ok(true)
    }

    /// Take the slot's lock and load its current state under it
    async fn lock_slot(&self, slot_id: i32) -> DomainResult<(OwnedMutexGuard<()>, Slot)> {
        let existing = self.locks.get(&slot_id).map(|entry| Arc::clone(entry.value()));
        let lock = match existing {
            Some(lock) => lock,
            None => {
                // Unknown ids never get a lock entry.
                self.get(slot_id).await?;
                Arc::clone(self.locks.entry(slot_id).or_default().value())
            }
        };

        let guard = lock.lock_owned().await;
        let slot = self.get(slot_id).await?;
        Ok((guard, slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use crate::domain::history::HistoryRepository;
    use crate::domain::slot::SlotRepository;
    use crate::domain::{CompletedSession, HistoryRecord, Occupancy, PaymentStatus};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::time::FixedClock;

    const T0: i64 = 1_700_000_000;

    struct Fixture {
        registry: Arc<SlotRegistry>,
        ledger: Arc<HistoryLedger>,
        clock: Arc<FixedClock>,
    }

    async fn fixture() -> Fixture {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let ledger = Arc::new(HistoryLedger::new(repos.clone()));
        let clock = Arc::new(FixedClock::new(T0));
        let registry = Arc::new(SlotRegistry::new(repos, ledger.clone(), clock.clone()));
        registry.provision(&[1, 2, 3, 4]).await.unwrap();
        Fixture {
            registry,
            ledger,
            clock,
        }
    }

    fn contact() -> ContactInfo {
        ContactInfo::new("KA01AB1234", "driver@example.com", "+15550100")
    }

    fn reserve_cmd(slot_id: i32, hours: i64) -> ReserveCommand {
        ReserveCommand {
            slot_id,
            contact: contact(),
            arrival_time: None,
            duration_hours: Decimal::from(hours),
        }
    }

    #[tokio::test]
    async fn provision_is_idempotent() {
        let f = fixture().await;
        f.registry.begin_occupancy(1).await.unwrap();
        assert_eq!(f.registry.provision(&[1, 2, 5]).await.unwrap(), 1);

        let slots = f.registry.list().await.unwrap();
        assert_eq!(slots.len(), 5);
        assert_eq!(slots[0].state(), SlotState::Occupied);
    }

    #[tokio::test]
    async fn reserve_unavailable_slot_leaves_it_unchanged() {
        let f = fixture().await;
        f.registry.reserve(reserve_cmd(4, 2)).await.unwrap();
        let before = f.registry.get(4).await.unwrap();

        let mut other = reserve_cmd(4, 1);
        other.contact = ContactInfo::new("X", "other@example.com", "1");
        let err = f.registry.reserve(other).await.unwrap_err();

        assert_eq!(err, DomainError::SlotUnavailable(4));
        assert_eq!(f.registry.get(4).await.unwrap(), before);
    }

    #[tokio::test]
    async fn reserve_rejects_past_arrival_and_bad_duration() {
        let f = fixture().await;
        let mut past = reserve_cmd(1, 1);
        past.arrival_time = Some(T0 - 1);
        assert!(matches!(
            f.registry.reserve(past).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            f.registry.reserve(reserve_cmd(1, 0)).await,
            Err(DomainError::Validation(_))
        ));
        assert!(f.registry.get(1).await.unwrap().is_available());
    }

    #[tokio::test]
    async fn unknown_slot_is_reported() {
        let f = fixture().await;
        assert_eq!(
            f.registry.begin_occupancy(99).await.unwrap_err(),
            DomainError::UnknownSlot(99)
        );
        assert_eq!(
            f.registry.reserve(reserve_cmd(99, 1)).await.unwrap_err(),
            DomainError::UnknownSlot(99)
        );
    }

    #[tokio::test]
    async fn pay_bill_records_pending_session_and_frees_slot() {
        let f = fixture().await;
        f.registry.begin_occupancy(2).await.unwrap();
        f.clock.advance(95);

        let settlement = f.registry.pay_bill(2, contact()).await.unwrap();
        assert_eq!(settlement.breakdown.duration_minutes, 1);
        assert_eq!(settlement.breakdown.total_amount, Decimal::from(130));
        assert!(f.registry.get(2).await.unwrap().is_available());

        let record = f.ledger.get(settlement.history_id).await.unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Pending);
        assert_eq!(record.entry_time, T0);
        assert_eq!(record.exit_time, T0 + 95);

        assert_eq!(
            f.registry.pay_bill(2, contact()).await.unwrap_err(),
            DomainError::SlotNotOccupied(2)
        );
        assert_eq!(f.ledger.query(50).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancel_with_wrong_email_keeps_reservation() {
        let f = fixture().await;
        f.registry.reserve(reserve_cmd(3, 2)).await.unwrap();

        let err = f
            .registry
            .cancel_reservation(3, "someone@else.com")
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::EmailMismatch(3));
        assert_eq!(f.registry.get(3).await.unwrap().state(), SlotState::Reserved);

        let outcome = f
            .registry
            .cancel_reservation(3, "driver@example.com")
            .await
            .unwrap();
        assert_eq!(outcome, CancelOutcome::Freed { slot_id: 3 });
        assert!(f.ledger.query(50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_after_arrival_bills_the_stay() {
        let f = fixture().await;
        f.registry.reserve(reserve_cmd(1, 2)).await.unwrap();
        f.registry.begin_occupancy(1).await.unwrap();
        f.clock.advance(600);

        let outcome = f
            .registry
            .cancel_reservation(1, "driver@example.com")
            .await
            .unwrap();
        let CancelOutcome::Settled(settlement) = outcome else {
            panic!("expected a settled cancellation");
        };
        assert_eq!(settlement.breakdown.duration_minutes, 10);
        assert!(f.ledger.get(settlement.history_id).await.is_ok());
        assert!(f.registry.get(1).await.unwrap().is_available());
    }

    #[tokio::test]
    async fn cancel_on_free_slot_is_not_reserved() {
        let f = fixture().await;
        assert_eq!(
            f.registry
                .cancel_reservation(1, "driver@example.com")
                .await
                .unwrap_err(),
            DomainError::SlotNotReserved(1)
        );
    }

    #[tokio::test]
    async fn occupy_if_vacant_skips_occupied_slots() {
        let f = fixture().await;
        assert!(f.registry.occupy_if_vacant(1).await.unwrap().is_some());
        f.clock.advance(30);
        assert!(f.registry.occupy_if_vacant(1).await.unwrap().is_none());
        assert_eq!(f.registry.get(1).await.unwrap().entry_time(), Some(T0));
    }

    #[tokio::test]
    async fn reset_discards_without_history() {
        let f = fixture().await;
        f.registry.begin_occupancy(1).await.unwrap();
        f.registry.reserve(reserve_cmd(2, 1)).await.unwrap();

        assert_eq!(f.registry.reset(1).await.unwrap(), SlotState::Occupied);
        assert_eq!(f.registry.reset_all().await.unwrap(), vec![2]);
        assert!(f
            .registry
            .list()
            .await
            .unwrap()
            .iter()
            .all(|s| *s.occupancy() == Occupancy::Available));
        assert!(f.ledger.query(50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expire_if_stale_respects_window() {
        let f = fixture().await;
        f.registry.reserve(reserve_cmd(1, 1)).await.unwrap();

        assert!(!f.registry.expire_if_stale(1, T0 + 3_600).await.unwrap());
        assert!(f.registry.expire_if_stale(1, T0 + 3_601).await.unwrap());
        assert!(!f.registry.expire_if_stale(1, T0 + 3_601).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_reserve_has_exactly_one_winner() {
        let f = fixture().await;
        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = f.registry.clone();
            handles.push(tokio::spawn(async move {
                let mut cmd = reserve_cmd(4, 1);
                cmd.contact = ContactInfo::new(format!("V{i}"), format!("{i}@example.com"), "1");
                registry.reserve(cmd).await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(e) => assert_eq!(e, DomainError::SlotUnavailable(4)),
            }
        }
        assert_eq!(wins, 1);
    }

    /// In-memory storage whose next settlement fails before writing anything
    struct FailingSettle {
        inner: InMemoryRepositoryProvider,
        fail_next: AtomicBool,
    }

    #[async_trait]
    impl RepositoryProvider for FailingSettle {
        fn slots(&self) -> &dyn SlotRepository {
            self.inner.slots()
        }

        fn history(&self) -> &dyn HistoryRepository {
            self.inner.history()
        }

        async fn settle(
            &self,
            slot: &Slot,
            session: CompletedSession,
        ) -> DomainResult<HistoryRecord> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(DomainError::Storage("disk full".to_string()));
            }
            self.inner.settle(slot, session).await
        }
    }

    #[tokio::test]
    async fn failed_settlement_keeps_slot_occupied_and_bills_once_on_retry() {
        let repos = Arc::new(FailingSettle {
            inner: InMemoryRepositoryProvider::new(),
            fail_next: AtomicBool::new(false),
        });
        let ledger = Arc::new(HistoryLedger::new(repos.clone()));
        let clock = Arc::new(FixedClock::new(T0));
        let registry = SlotRegistry::new(repos.clone(), ledger.clone(), clock.clone());
        registry.provision(&[1]).await.unwrap();

        registry.begin_occupancy(1).await.unwrap();
        clock.advance(95);
        repos.fail_next.store(true, Ordering::SeqCst);

        let err = registry.pay_bill(1, contact()).await.unwrap_err();
        assert_eq!(err, DomainError::Storage("disk full".to_string()));
        let slot = registry.get(1).await.unwrap();
        assert_eq!(slot.state(), SlotState::Occupied);
        assert_eq!(slot.entry_time(), Some(T0));
        assert!(ledger.query(50).await.unwrap().is_empty());

        let settlement = registry.pay_bill(1, contact()).await.unwrap();
        assert_eq!(settlement.breakdown.entry_time, T0);
        assert_eq!(ledger.query(50).await.unwrap().len(), 1);
        assert!(registry.get(1).await.unwrap().is_available());
    }

    #[tokio::test]
    async fn concurrent_settlements_record_exactly_one_session() {
        let f = fixture().await;
        f.registry.reserve(reserve_cmd(2, 2)).await.unwrap();
        f.registry.begin_occupancy(2).await.unwrap();
        f.clock.advance(300);

        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = f.registry.clone();
            handles.push(tokio::spawn(async move {
                let settled: DomainResult<i32> = if i % 2 == 0 {
                    registry.pay_bill(2, contact()).await.map(|s| s.history_id)
                } else {
                    registry
                        .cancel_reservation(2, "driver@example.com")
                        .await
                        .map(|outcome| match outcome {
                            CancelOutcome::Settled(s) => s.history_id,
                            CancelOutcome::Freed { .. } => {
                                panic!("an occupied reservation must be billed")
                            }
                        })
                };
                settled
            }));
        }

        let mut settled = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(id) => settled.push(id),
                Err(e) => assert!(
                    matches!(
                        e,
                        DomainError::SlotNotOccupied(2) | DomainError::SlotNotReserved(2)
                    ),
                    "unexpected error {e:?}"
                ),
            }
        }

        assert_eq!(settled.len(), 1);
        let history = f.ledger.query(50).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, settled[0]);
        assert!(f.registry.get(2).await.unwrap().is_available());
    }

    #[tokio::test]
    async fn oversized_reservation_is_rejected() {
        let f = fixture().await;
        let mut cmd = reserve_cmd(1, 1);
        cmd.duration_hours = Decimal::from_str_exact("100000000000000000000000000").unwrap();

        assert!(matches!(
            f.registry.reserve(cmd).await,
            Err(DomainError::Validation(_))
        ));
        assert!(f.registry.get(1).await.unwrap().is_available());
    }
}
