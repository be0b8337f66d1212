//! Parking service: the façade every outer surface talks to.
//!
//! Composes the slot registry, the history ledger and the expiry policy,
//! and publishes a notification event after each committed transition.
//! Events are published once the slot lock has been released; a failure
//! to deliver them never affects the transition itself.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::history_ledger::HistoryLedger;
use super::reservation_expiry::ReservationExpiryPolicy;
use super::slot_registry::{CancelOutcome, ReserveCommand, Settlement, SlotRegistry};
use crate::application::events::{
    BillGeneratedEvent, Event, HistoryClearedEvent, OccupancyStartedEvent,
    PaymentConfirmedEvent, ReservationCancelledEvent, ReservationConfirmedEvent, SharedEventBus,
    SlotEvent,
};
use crate::domain::billing::{self, Money};
use crate::domain::{
    ContactInfo, DomainError, DomainResult, HistoryRecord, RepositoryProvider, RevenueStats,
    Slot, SlotState,
};
use crate::shared::time::SharedClock;

/// A confirmed reservation with its quoted charge
#[derive(Debug, Clone)]
pub struct Reservation {
    pub slot: Slot,
    pub quoted_charge: Money,
}

/// One occupancy report from the sensor feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    pub slot_id: i32,
    pub occupied: bool,
}

pub struct ParkingService {
    registry: Arc<SlotRegistry>,
    ledger: Arc<HistoryLedger>,
    expiry: ReservationExpiryPolicy,
    event_bus: SharedEventBus,
    clock: SharedClock,
}

impl ParkingService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        event_bus: SharedEventBus,
        clock: SharedClock,
    ) -> Self {
        let ledger = Arc::new(HistoryLedger::new(repos.clone()));
        let registry = Arc::new(SlotRegistry::new(repos, ledger.clone(), clock.clone()));
        let expiry = ReservationExpiryPolicy::new(registry.clone());
        Self {
            registry,
            ledger,
            expiry,
            event_bus,
            clock,
        }
    }

    /// Current time (epoch seconds) as seen by the service
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    pub async fn provision(&self, slot_ids: &[i32]) -> DomainResult<usize> {
        let created = self.registry.provision(slot_ids).await?;
        if created > 0 {
            info!(created, "🅿️ Parking slots provisioned");
        }
        Ok(created)
    }

    // ── Slots ──────────────────────────────────────────────────

    /// All slots ordered by id. Lapsed reservations are released first.
    pub async fn list_slots(&self) -> DomainResult<Vec<Slot>> {
        self.reconcile_expired(self.now()).await?;
        self.registry.list().await
    }

    pub async fn get_slot(&self, slot_id: i32) -> DomainResult<Slot> {
        self.registry.get(slot_id).await
    }

    /// Number of provisioned slots; doubles as a storage probe
    pub async fn slot_count(&self) -> DomainResult<usize> {
        Ok(self.registry.list().await?.len())
    }

    pub fn quote_reservation(&self, duration_hours: Decimal) -> DomainResult<Money> {
        billing::reservation_quote(duration_hours)
    }

    pub async fn reserve(&self, cmd: ReserveCommand) -> DomainResult<Reservation> {
        let quoted_charge = billing::reservation_quote(cmd.duration_hours)?;
        let slot = self.registry.reserve(cmd).await?;

        metrics::counter!("parking_reservations_total").increment(1);

        if let (Some(contact), Some(window)) = (slot.contact(), slot.reservation()) {
            self.event_bus
                .publish(Event::ReservationConfirmed(ReservationConfirmedEvent {
                    slot_id: slot.slot_id(),
                    vehicle_number: contact.vehicle_number.clone(),
                    user_email: contact.user_email.clone(),
                    user_phone: contact.user_phone.clone(),
                    arrival_time: window.arrival_time,
                    duration_hours: window.duration_hours,
                    quoted_charge,
                    timestamp: self.clock.now_utc(),
                }));
        }

        Ok(Reservation {
            slot,
            quoted_charge,
        })
    }

    pub async fn cancel_reservation(
        &self,
        slot_id: i32,
        confirm_email: &str,
    ) -> DomainResult<CancelOutcome> {
        let outcome = self
            .registry
            .cancel_reservation(slot_id, confirm_email)
            .await?;

        let history_id = match &outcome {
            CancelOutcome::Freed { .. } => None,
            CancelOutcome::Settled(settlement) => {
                metrics::counter!("parking_settlements_total", "source" => "cancel").increment(1);
                self.publish_bill(settlement);
                Some(settlement.history_id)
            }
        };
        metrics::counter!("parking_cancellations_total").increment(1);

        self.event_bus
            .publish(Event::ReservationCancelled(ReservationCancelledEvent {
                slot_id,
                user_email: confirm_email.to_string(),
                history_id,
                timestamp: self.clock.now_utc(),
            }));

        Ok(outcome)
    }

    pub async fn begin_occupancy(&self, slot_id: i32) -> DomainResult<Slot> {
        let slot = self.registry.begin_occupancy(slot_id).await?;
        self.publish_occupancy(&slot);
        Ok(slot)
    }

    pub async fn pay_bill(&self, slot_id: i32, contact: ContactInfo) -> DomainResult<Settlement> {
        let settlement = self.registry.pay_bill(slot_id, contact).await?;

        metrics::counter!("parking_settlements_total", "source" => "pay_bill").increment(1);
        self.publish_bill(&settlement);

        Ok(settlement)
    }

    /// Returns the state the slot was in before the reset
    pub async fn reset_slot(&self, slot_id: i32) -> DomainResult<SlotState> {
        let previous = self.registry.reset(slot_id).await?;
        if previous != SlotState::Available {
            self.publish_reset(slot_id);
        }
        Ok(previous)
    }

    /// Returns how many slots were not already AVAILABLE
    pub async fn reset_all_slots(&self) -> DomainResult<usize> {
        let changed = self.registry.reset_all().await?;
        for &slot_id in &changed {
            self.publish_reset(slot_id);
        }
        info!(count = changed.len(), "🔄 All slots reset");
        Ok(changed.len())
    }

    /// Apply a batch of sensor readings. Slots reported occupied start a
    /// session unless one is already running; departures are ignored since
    /// leaving a slot requires a bill. Returns how many slots transitioned.
    pub async fn ingest_sensor_readings(&self, readings: &[SensorReading]) -> DomainResult<usize> {
        let mut transitioned = 0;
        for reading in readings.iter().filter(|r| r.occupied) {
            match self.registry.occupy_if_vacant(reading.slot_id).await {
                Ok(Some(slot)) => {
                    metrics::counter!("parking_sensor_occupancies_total").increment(1);
                    self.publish_occupancy(&slot);
                    transitioned += 1;
                }
                Ok(None) => {}
                Err(DomainError::UnknownSlot(slot_id)) => {
                    warn!(slot_id, "Sensor reading for unknown slot ignored");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(transitioned)
    }

    /// Release lapsed reservations. Returns how many were freed.
    pub async fn reconcile_expired(&self, now: i64) -> DomainResult<usize> {
        let expired = self.expiry.reconcile_expired(now).await?;
        for &slot_id in &expired {
            metrics::counter!("parking_reservations_expired_total").increment(1);
            self.event_bus.publish(Event::ReservationExpired(SlotEvent {
                slot_id,
                timestamp: self.clock.now_utc(),
            }));
        }
        Ok(expired.len())
    }

    // ── History ────────────────────────────────────────────────

    pub async fn history(&self, limit: u64) -> DomainResult<Vec<HistoryRecord>> {
        self.ledger.query(limit).await
    }

    pub async fn pending_payments(&self) -> DomainResult<Vec<HistoryRecord>> {
        self.ledger.pending().await
    }

    pub async fn revenue_stats(&self) -> DomainResult<RevenueStats> {
        self.ledger.revenue_stats().await
    }

    pub async fn mark_paid(&self, history_id: i32) -> DomainResult<HistoryRecord> {
        let record = self.ledger.mark_paid(history_id).await?;
        self.event_bus
            .publish(Event::PaymentConfirmed(PaymentConfirmedEvent {
                slot_id: record.slot_id,
                history_id: record.id,
                total_amount: record.total_amount,
                timestamp: self.clock.now_utc(),
            }));
        Ok(record)
    }

    pub async fn clear_history(&self) -> DomainResult<u64> {
        let removed = self.ledger.clear_all().await?;
        self.event_bus.publish(Event::HistoryCleared(HistoryClearedEvent {
            removed,
            timestamp: self.clock.now_utc(),
        }));
        Ok(removed)
    }

    // ── Notifications ──────────────────────────────────────────

    fn publish_occupancy(&self, slot: &Slot) {
        if let Some(entry_time) = slot.entry_time() {
            self.event_bus
                .publish(Event::OccupancyStarted(OccupancyStartedEvent {
                    slot_id: slot.slot_id(),
                    entry_time,
                    vehicle_number: slot.contact().map(|c| c.vehicle_number.clone()),
                    timestamp: self.clock.now_utc(),
                }));
        }
    }

    fn publish_bill(&self, settlement: &Settlement) {
        self.event_bus.publish(Event::BillGenerated(BillGeneratedEvent {
            slot_id: settlement.slot_id,
            history_id: settlement.history_id,
            vehicle_number: settlement.contact.vehicle_number.clone(),
            user_email: settlement.contact.user_email.clone(),
            user_phone: settlement.contact.user_phone.clone(),
            breakdown: settlement.breakdown.clone(),
            timestamp: self.clock.now_utc(),
        }));
    }

    fn publish_reset(&self, slot_id: i32) {
        self.event_bus.publish(Event::SlotReset(SlotEvent {
            slot_id,
            timestamp: self.clock.now_utc(),
        }));
    }
}
