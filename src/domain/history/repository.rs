//! History repository interface

use async_trait::async_trait;

use super::model::{CompletedSession, HistoryRecord, PaymentStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append a PENDING record. Ids increase monotonically and are never
    /// reused, including after `clear_all`.
    async fn append(&self, session: CompletedSession) -> DomainResult<HistoryRecord>;

    /// Most recent first, at most `limit` records
    async fn find_recent(&self, limit: u64) -> DomainResult<Vec<HistoryRecord>>;

    /// All records with `status`, most recent first
    async fn find_by_status(&self, status: PaymentStatus) -> DomainResult<Vec<HistoryRecord>>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<HistoryRecord>>;

    /// Compare-and-swap PENDING → PAID on a single record.
    /// Fails with `NotFound` or `AlreadyPaid`.
    async fn mark_paid(&self, id: i32) -> DomainResult<HistoryRecord>;

    /// Delete every record, returning how many were removed
    async fn clear_all(&self) -> DomainResult<u64>;
}
