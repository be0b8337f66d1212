//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider` - unified access to the per-aggregate repositories
//! - `DomainResult` - standard result type for domain operations

use async_trait::async_trait;

use super::history::{CompletedSession, HistoryRecord, HistoryRepository};
use super::slot::{Slot, SlotRepository};

pub use crate::shared::errors::DomainResult;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let slot = repos.slots().find_by_id(1).await?;
///     let recent = repos.history().find_recent(50).await?;
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    fn slots(&self) -> &dyn SlotRepository;
    fn history(&self) -> &dyn HistoryRepository;

    /// Append `session` as a PENDING record and persist `slot` in one unit
    /// of work. Either both writes land or neither does.
    async fn settle(&self, slot: &Slot, session: CompletedSession) -> DomainResult<HistoryRecord>;
}
