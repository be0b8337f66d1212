//! SeaORM implementation of SlotRepository

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};
use tracing::debug;

use super::db_err;
use crate::domain::slot::SlotRepository;
use crate::domain::{
    ContactInfo, DomainError, DomainResult, Occupancy, ReservationWindow, Slot, SlotState,
};
use crate::infrastructure::database::entities::slot;

pub struct SeaOrmSlotRepository {
    db: DatabaseConnection,
}

impl SeaOrmSlotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn corrupt(slot_id: i32, field: &str) -> DomainError {
    DomainError::Storage(format!("slot {}: missing or invalid {}", slot_id, field))
}

fn model_to_domain(m: slot::Model) -> DomainResult<Slot> {
    let slot_id = m.slot_id;
    let state: SlotState = m.state.parse().map_err(|_| corrupt(slot_id, "state"))?;

    let contact = match (m.vehicle_number, m.user_email, m.user_phone) {
        (Some(vehicle_number), Some(user_email), Some(user_phone)) => Some(ContactInfo {
            vehicle_number,
            user_email,
            user_phone,
        }),
        _ => None,
    };

    let occupancy = match state {
        SlotState::Available => Occupancy::Available,
        SlotState::Reserved => {
            let duration_hours = m
                .reserved_duration_hours
                .as_deref()
                .and_then(|s| Decimal::from_str(s).ok())
                .ok_or_else(|| corrupt(slot_id, "reserved_duration_hours"))?;
            Occupancy::Reserved {
                contact: contact.ok_or_else(|| corrupt(slot_id, "contact"))?,
                window: ReservationWindow {
                    arrival_time: m
                        .arrival_time
                        .ok_or_else(|| corrupt(slot_id, "arrival_time"))?,
                    duration_hours,
                },
            }
        }
        SlotState::Occupied => Occupancy::Occupied {
            contact,
            entry_time: m.entry_time.ok_or_else(|| corrupt(slot_id, "entry_time"))?,
            from_reservation: m.from_reservation,
        },
    };

    Ok(Slot::restore(slot_id, occupancy))
}

fn domain_to_active(s: &Slot) -> slot::ActiveModel {
    let contact = s.contact();
    let window = s.reservation();
    let from_reservation = matches!(
        s.occupancy(),
        Occupancy::Occupied {
            from_reservation: true,
            ..
        }
    );

    slot::ActiveModel {
        slot_id: Set(s.slot_id()),
        state: Set(s.state().as_str().to_string()),
        vehicle_number: Set(contact.map(|c| c.vehicle_number.clone())),
        user_email: Set(contact.map(|c| c.user_email.clone())),
        user_phone: Set(contact.map(|c| c.user_phone.clone())),
        entry_time: Set(s.entry_time()),
        arrival_time: Set(window.map(|w| w.arrival_time)),
        reserved_duration_hours: Set(window.map(|w| w.duration_hours.to_string())),
        from_reservation: Set(from_reservation),
        updated_at: Set(Utc::now()),
    }
}

/// Overwrite an existing slot row; a missing row is `UnknownSlot`
pub(super) async fn write_slot<C: ConnectionTrait>(conn: &C, s: &Slot) -> DomainResult<()> {
    debug!(slot_id = s.slot_id(), state = %s.state(), "Updating slot");

    match slot::Entity::update(domain_to_active(s)).exec(conn).await {
        Ok(_) => Ok(()),
        Err(DbErr::RecordNotUpdated) => Err(DomainError::UnknownSlot(s.slot_id())),
        Err(e) => Err(db_err(e)),
    }
}

// ── SlotRepository impl ─────────────────────────────────────────

#[async_trait]
impl SlotRepository for SeaOrmSlotRepository {
    async fn find_all(&self) -> DomainResult<Vec<Slot>> {
        let models = slot::Entity::find()
            .order_by_asc(slot::Column::SlotId)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn find_by_id(&self, slot_id: i32) -> DomainResult<Option<Slot>> {
        let model = slot::Entity::find_by_id(slot_id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn insert_if_absent(&self, s: Slot) -> DomainResult<bool> {
        let existing = slot::Entity::find_by_id(s.slot_id())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Ok(false);
        }

        debug!(slot_id = s.slot_id(), "Inserting slot");
        slot::Entity::insert(domain_to_active(&s))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(true)
    }

    async fn update(&self, s: &Slot) -> DomainResult<()> {
        write_slot(&self.db, s).await
    }
}
