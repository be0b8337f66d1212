pub mod errors;
pub mod shutdown;
pub mod time;

pub use errors::{DomainError, DomainResult, InfraError};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
pub use time::{Clock, FixedClock, SharedClock, SystemClock};
