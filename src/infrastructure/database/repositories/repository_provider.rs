//! SeaORM implementation of RepositoryProvider

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::warn;

use crate::domain::history::HistoryRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::slot::SlotRepository;
use crate::domain::{CompletedSession, DomainError, DomainResult, HistoryRecord, Slot};

use super::db_err;
use super::history_repository::{insert_session, SeaOrmHistoryRepository};
use super::slot_repository::{write_slot, SeaOrmSlotRepository};

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let slot = repos.slots().find_by_id(1).await?;
/// let pending = repos.history().find_by_status(PaymentStatus::Pending).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    db: DatabaseConnection,
    slots: SeaOrmSlotRepository,
    history: SeaOrmHistoryRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            slots: SeaOrmSlotRepository::new(db.clone()),
            history: SeaOrmHistoryRepository::new(db.clone()),
            db,
        }
    }
}

#[async_trait]
impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn slots(&self) -> &dyn SlotRepository {
        &self.slots
    }

    fn history(&self) -> &dyn HistoryRepository {
        &self.history
    }

    async fn settle(&self, slot: &Slot, session: CompletedSession) -> DomainResult<HistoryRecord> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let written = async {
            let record = insert_session(&txn, session).await?;
            write_slot(&txn, slot).await?;
            Ok::<_, DomainError>(record)
        }
        .await;

        match written {
            Ok(record) => {
                txn.commit().await.map_err(db_err)?;
                Ok(record)
            }
            Err(e) => {
                if let Err(rb) = txn.rollback().await {
                    warn!(slot_id = slot.slot_id(), "Settlement rollback failed: {}", rb);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{billing, ContactInfo};
    use crate::infrastructure::database::test_database;

    fn session(slot_id: i32) -> CompletedSession {
        CompletedSession {
            slot_id,
            contact: ContactInfo::new("KA01", "a@example.com", "555"),
            breakdown: billing::compute(0, 95).unwrap(),
        }
    }

    #[tokio::test]
    async fn settle_writes_record_and_slot_together() {
        let repos = SeaOrmRepositoryProvider::new(test_database().await);
        let mut slot = Slot::new(1);
        slot.begin_occupancy(0).unwrap();
        repos.slots().insert_if_absent(slot.clone()).await.unwrap();

        let mut freed = slot.clone();
        freed.pay_bill(ContactInfo::new("KA01", "a@example.com", "555"), 95).unwrap();

        let record = repos.settle(&freed, session(1)).await.unwrap();
        let stored = repos.history().find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.slot_id, 1);
        assert_eq!(stored.total_amount, record.total_amount);
        assert!(repos.slots().find_by_id(1).await.unwrap().unwrap().is_available());
    }

    #[tokio::test]
    async fn failed_slot_write_rolls_back_the_record() {
        let repos = SeaOrmRepositoryProvider::new(test_database().await);

        let err = repos.settle(&Slot::new(7), session(7)).await.unwrap_err();
        assert_eq!(err, DomainError::UnknownSlot(7));
        assert!(repos.history().find_recent(50).await.unwrap().is_empty());
    }
}
