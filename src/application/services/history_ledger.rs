//! Parking history ledger

use std::sync::Arc;

use tracing::info;

use crate::domain::billing::to_minor_units;
use crate::domain::{
    CompletedSession, DomainError, DomainResult, HistoryRecord, PaymentStatus,
    RepositoryProvider, RevenueStats, Slot,
};

/// Upper bound on a single history query
pub const MAX_HISTORY_LIMIT: u64 = 1_000;

/// Append-only record of completed sessions and their payment status
pub struct HistoryLedger {
    repos: Arc<dyn RepositoryProvider>,
}

impl HistoryLedger {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Record a settled session as PENDING
    pub async fn append(&self, session: CompletedSession) -> DomainResult<HistoryRecord> {
        let record = self.repos.history().append(session).await?;
        info!(
            history_id = record.id,
            slot_id = record.slot_id,
            total_amount = %record.total_amount,
            "🧾 Session recorded"
        );
        Ok(record)
    }

    /// Record `session` and persist the freed `slot` atomically
    pub async fn settle(&self, slot: &Slot, session: CompletedSession) -> DomainResult<HistoryRecord> {
        let record = self.repos.settle(slot, session).await?;
        info!(
            history_id = record.id,
            slot_id = record.slot_id,
            total_amount = %record.total_amount,
            "🧾 Session recorded"
        );
        Ok(record)
    }

    /// Most recent first, at most `MAX_HISTORY_LIMIT` records
    pub async fn query(&self, limit: u64) -> DomainResult<Vec<HistoryRecord>> {
        self.repos
            .history()
            .find_recent(limit.min(MAX_HISTORY_LIMIT))
            .await
    }

    pub async fn pending(&self) -> DomainResult<Vec<HistoryRecord>> {
        self.repos
            .history()
            .find_by_status(PaymentStatus::Pending)
            .await
    }

    pub async fn get(&self, id: i32) -> DomainResult<HistoryRecord> {
        self.repos
            .history()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::history_not_found(id))
    }

    pub async fn mark_paid(&self, id: i32) -> DomainResult<HistoryRecord> {
        let record = self.repos.history().mark_paid(id).await?;

        metrics::counter!("parking_payments_total").increment(1);
        metrics::counter!("parking_revenue_paid_total")
            .increment(u64::try_from(to_minor_units(record.total_amount)).unwrap_or(0));

        info!(
            history_id = id,
            slot_id = record.slot_id,
            total_amount = %record.total_amount,
            "💰 Payment confirmed"
        );
        Ok(record)
    }

    pub async fn revenue_stats(&self) -> DomainResult<RevenueStats> {
        let paid = self
            .repos
            .history()
            .find_by_status(PaymentStatus::Paid)
            .await?;
        Ok(RevenueStats::from_records(&paid))
    }

    pub async fn clear_all(&self) -> DomainResult<u64> {
        let removed = self.repos.history().clear_all().await?;
        info!(removed, "🗑️ Parking history cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{billing, ContactInfo};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use rust_decimal::Decimal;

    fn ledger() -> HistoryLedger {
        HistoryLedger::new(Arc::new(InMemoryRepositoryProvider::new()))
    }

    fn session(exit: i64) -> CompletedSession {
        CompletedSession {
            slot_id: 1,
            contact: ContactInfo::new("KA01AB1234", "driver@example.com", "+15550100"),
            breakdown: billing::compute(0, exit).unwrap(),
        }
    }

    #[tokio::test]
    async fn revenue_counts_paid_records_once() {
        let ledger = ledger();
        let a = ledger.append(session(95)).await.unwrap();
        ledger.append(session(30)).await.unwrap();

        assert_eq!(ledger.revenue_stats().await.unwrap(), RevenueStats::default());

        ledger.mark_paid(a.id).await.unwrap();
        assert!(matches!(
            ledger.mark_paid(a.id).await,
            Err(DomainError::AlreadyPaid(_))
        ));

        let stats = ledger.revenue_stats().await.unwrap();
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.total_revenue, Decimal::from(130));
    }

    #[tokio::test]
    async fn pending_excludes_paid() {
        let ledger = ledger();
        let a = ledger.append(session(60)).await.unwrap();
        let b = ledger.append(session(120)).await.unwrap();
        ledger.mark_paid(a.id).await.unwrap();

        let pending = ledger.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);
    }

    #[tokio::test]
    async fn clear_all_empties_history_and_revenue() {
        let ledger = ledger();
        let a = ledger.append(session(60)).await.unwrap();
        ledger.mark_paid(a.id).await.unwrap();

        assert_eq!(ledger.clear_all().await.unwrap(), 1);
        assert!(ledger.query(50).await.unwrap().is_empty());
        let stats = ledger.revenue_stats().await.unwrap();
        assert_eq!(stats.total_revenue, Decimal::ZERO);
        assert_eq!(stats.total_sessions, 0);
    }

    #[tokio::test]
    async fn get_unknown_record_is_not_found() {
        let err = ledger().get(42).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn oversized_query_limit_is_capped() {
        use crate::infrastructure::database::{test_database, SeaOrmRepositoryProvider};

        let ledger = HistoryLedger::new(Arc::new(SeaOrmRepositoryProvider::new(
            test_database().await,
        )));
        for exit in [60, 120] {
            ledger.append(session(exit)).await.unwrap();
        }
        assert_eq!(ledger.query(u64::MAX).await.unwrap().len(), 2);
        assert_eq!(ledger.query(1).await.unwrap().len(), 1);
    }
}
