//! SeaORM implementation of HistoryRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::debug;

use super::db_err;
use crate::domain::billing::{from_minor_units, to_minor_units};
use crate::domain::history::HistoryRepository;
use crate::domain::{CompletedSession, DomainError, DomainResult, HistoryRecord, PaymentStatus};
use crate::infrastructure::database::entities::history_record;

pub struct SeaOrmHistoryRepository {
    db: DatabaseConnection,
}

impl SeaOrmHistoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: history_record::Model) -> DomainResult<HistoryRecord> {
    let payment_status: PaymentStatus = m.payment_status.parse().map_err(|_| {
        DomainError::Storage(format!(
            "history {}: unknown payment status {}",
            m.id, m.payment_status
        ))
    })?;

    Ok(HistoryRecord {
        id: m.id,
        slot_id: m.slot_id,
        vehicle_number: m.vehicle_number,
        user_email: m.user_email,
        user_phone: m.user_phone,
        entry_time: m.entry_time,
        exit_time: m.exit_time,
        duration_minutes: m.duration_minutes,
        base_charge: from_minor_units(m.base_charge),
        minute_charge: from_minor_units(m.minute_charge),
        total_amount: from_minor_units(m.total_amount),
        payment_status,
        created_at: m.created_at,
    })
}

fn collect(models: Vec<history_record::Model>) -> DomainResult<Vec<HistoryRecord>> {
    models.into_iter().map(model_to_domain).collect()
}

/// Insert a PENDING record on any connection, including an open transaction
pub(super) async fn insert_session<C: ConnectionTrait>(
    conn: &C,
    session: CompletedSession,
) -> DomainResult<HistoryRecord> {
    debug!(slot_id = session.slot_id, "Appending history record");

    let CompletedSession {
        slot_id,
        contact,
        breakdown,
    } = session;

    let model = history_record::ActiveModel {
        id: NotSet,
        slot_id: Set(slot_id),
        vehicle_number: Set(contact.vehicle_number),
        user_email: Set(contact.user_email),
        user_phone: Set(contact.user_phone),
        entry_time: Set(breakdown.entry_time),
        exit_time: Set(breakdown.exit_time),
        duration_minutes: Set(breakdown.duration_minutes),
        base_charge: Set(to_minor_units(breakdown.base_charge)),
        minute_charge: Set(to_minor_units(breakdown.minute_charge)),
        total_amount: Set(to_minor_units(breakdown.total_amount)),
        payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
        created_at: Set(Utc::now()),
    };
    let inserted = model.insert(conn).await.map_err(db_err)?;
    model_to_domain(inserted)
}

// ── HistoryRepository impl ──────────────────────────────────────

#[async_trait]
impl HistoryRepository for SeaOrmHistoryRepository {
    async fn append(&self, session: CompletedSession) -> DomainResult<HistoryRecord> {
        insert_session(&self.db, session).await
    }

    async fn find_recent(&self, limit: u64) -> DomainResult<Vec<HistoryRecord>> {
        let models = history_record::Entity::find()
            .order_by_desc(history_record::Column::Id)
            .limit(limit.min(i64::MAX as u64))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }

    async fn find_by_status(&self, status: PaymentStatus) -> DomainResult<Vec<HistoryRecord>> {
        let models = history_record::Entity::find()
            .filter(history_record::Column::PaymentStatus.eq(status.as_str()))
            .order_by_desc(history_record::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        collect(models)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<HistoryRecord>> {
        let model = history_record::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn mark_paid(&self, id: i32) -> DomainResult<HistoryRecord> {
        // Single conditional UPDATE: only a PENDING row can flip.
        let result = history_record::Entity::update_many()
            .col_expr(
                history_record::Column::PaymentStatus,
                Expr::value(PaymentStatus::Paid.as_str()),
            )
            .filter(history_record::Column::Id.eq(id))
            .filter(history_record::Column::PaymentStatus.eq(PaymentStatus::Pending.as_str()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        let record = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::history_not_found(id))?;

        if result.rows_affected == 0 {
            return Err(DomainError::AlreadyPaid(id));
        }
        Ok(record)
    }

    async fn clear_all(&self) -> DomainResult<u64> {
        let result = history_record::Entity::delete_many()
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        debug!(removed = result.rows_affected, "Cleared parking history");
        Ok(result.rows_affected)
    }
}
