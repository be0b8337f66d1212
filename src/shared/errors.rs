use thiserror::Error;

/// Errors surfaced by slot transitions, billing and the history ledger.
///
/// Every variant except `Storage` is a precondition violation: the operation
/// that returned it left all state exactly as it found it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Slot {0} is not available")]
    SlotUnavailable(i32),

    #[error("Slot {0} is not reserved")]
    SlotNotReserved(i32),

    #[error("Slot {0} is not occupied")]
    SlotNotOccupied(i32),

    #[error("Email does not match the reservation on slot {0}")]
    EmailMismatch(i32),

    #[error("Unknown slot: {0}")]
    UnknownSlot(i32),

    #[error("Invalid interval: exit {exit_time} is before entry {entry_time}")]
    InvalidInterval { entry_time: i64, exit_time: i64 },

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Payment for history record {0} is already confirmed")]
    AlreadyPaid(i32),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Storage(_))
    }

    pub fn history_not_found(id: i32) -> Self {
        DomainError::NotFound {
            entity: "HistoryRecord",
            field: "id",
            value: id.to_string(),
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl From<InfraError> for DomainError {
    fn from(e: InfraError) -> Self {
        DomainError::Storage(e.to_string())
    }
}
