//! Reservation expiry.
//!
//! `ReservationExpiryPolicy` frees reserved slots whose booked window has
//! lapsed, without any charge. `start_reservation_expiry_task` runs it on a
//! tokio interval until shutdown.

use std::sync::Arc;

use tokio::time::Duration;
use tracing::{info, warn};

use super::parking::ParkingService;
use super::slot_registry::SlotRegistry;
use crate::domain::{DomainResult, Occupancy};
use crate::shared::shutdown::ShutdownSignal;

pub struct ReservationExpiryPolicy {
    registry: Arc<SlotRegistry>,
}

impl ReservationExpiryPolicy {
    pub fn new(registry: Arc<SlotRegistry>) -> Self {
        Self { registry }
    }

    /// Free every RESERVED slot whose window lapsed at `now`.
    /// Returns the ids of the freed slots. Running it twice is harmless.
    pub async fn reconcile_expired(&self, now: i64) -> DomainResult<Vec<i32>> {
        let candidates: Vec<i32> = self
            .registry
            .list()
            .await?
            .into_iter()
            .filter(|slot| {
                matches!(slot.occupancy(), Occupancy::Reserved { window, .. } if window.is_expired(now))
            })
            .map(|slot| slot.slot_id())
            .collect();

        let mut expired = Vec::with_capacity(candidates.len());
        for slot_id in candidates {
            // Re-checked under the slot lock; the slot may have moved on.
            match self.registry.expire_if_stale(slot_id, now).await {
                Ok(true) => expired.push(slot_id),
                Ok(false) => {}
                Err(e) => warn!(slot_id, error = %e, "Failed to expire reservation"),
            }
        }
        Ok(expired)
    }
}

/// Start the reservation expiry background task.
///
/// Every `check_interval_secs` the task frees reservations whose window
/// has lapsed.
pub fn start_reservation_expiry_task(
    parking: Arc<ParkingService>,
    shutdown: ShutdownSignal,
    check_interval_secs: u64,
) {
    tokio::spawn(async move {
        info!(
            check_interval = check_interval_secs,
            "📅 Reservation expiry task started"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(check_interval_secs.max(1)));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match parking.reconcile_expired(parking.now()).await {
                        Ok(0) => {}
                        Ok(count) => info!(count, "Expired overdue reservations"),
                        Err(e) => warn!(error = %e, "Reservation expiry check error"),
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("📅 Reservation expiry task shutting down");
                    break;
                }
            }
        }

        info!("📅 Reservation expiry task stopped");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::services::slot_registry::ReserveCommand;
    use crate::application::services::HistoryLedger;
    use crate::domain::{ContactInfo, RepositoryProvider, SlotState};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::time::FixedClock;
    use rust_decimal::Decimal;

    const T0: i64 = 1_700_000_000;

    fn reserve(slot_id: i32, arrival_offset: i64, hours: i64) -> ReserveCommand {
        ReserveCommand {
            slot_id,
            contact: ContactInfo::new("KA01", "driver@example.com", "555"),
            arrival_time: Some(T0 + arrival_offset),
            duration_hours: Decimal::from(hours),
        }
    }

    #[tokio::test]
    async fn frees_only_lapsed_reservations() {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(InMemoryRepositoryProvider::new());
        let ledger = Arc::new(HistoryLedger::new(repos.clone()));
        let clock = Arc::new(FixedClock::new(T0));
        let registry = Arc::new(SlotRegistry::new(repos, ledger.clone(), clock));
        registry.provision(&[1, 2, 3]).await.unwrap();

        registry.reserve(reserve(1, 0, 1)).await.unwrap();
        registry.reserve(reserve(2, 0, 3)).await.unwrap();
        registry.begin_occupancy(3).await.unwrap();

        let policy = ReservationExpiryPolicy::new(registry.clone());
        assert_eq!(policy.reconcile_expired(T0 + 7_200).await.unwrap(), vec![1]);
        assert_eq!(registry.get(1).await.unwrap().state(), SlotState::Available);
        assert_eq!(registry.get(2).await.unwrap().state(), SlotState::Reserved);
        assert_eq!(registry.get(3).await.unwrap().state(), SlotState::Occupied);

        assert!(policy.reconcile_expired(T0 + 7_200).await.unwrap().is_empty());
        assert!(ledger.query(50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn background_task_stops_on_shutdown() {
        let clock = Arc::new(FixedClock::new(T0));
        let parking = Arc::new(ParkingService::new(
            Arc::new(InMemoryRepositoryProvider::new()),
            create_event_bus(),
            clock.clone(),
        ));
        parking.provision(&[1]).await.unwrap();
        parking.reserve(reserve(1, 0, 1)).await.unwrap();
        clock.advance(3_601);

        let shutdown = ShutdownSignal::new();
        start_reservation_expiry_task(parking.clone(), shutdown.clone(), 1);

        // The first tick fires immediately.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(parking.get_slot(1).await.unwrap().is_available());

        shutdown.trigger();
    }
}
