//! Error types.

use thiserror::Error;

use crate::entity::EntityId;

/// Boxed error returned by processors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`World`](crate::World) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The operation requires a live entity and this one is not (never created or deleted).
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),
}

/// Result type for world operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// Why a processor failed during a tick.
#[derive(Debug, Error)]
pub enum FailureCause {
    /// The processor returned an error.
    #[error("returned error: {0}")]
    Error(BoxError),
    /// The processor panicked; holds the panic message when it was a string.
    #[error("panicked: {0}")]
    Panic(String),
}

/// A processor that failed during a tick.
///
/// The scheduler records the failure and keeps running the other processors.
#[derive(Debug, Error)]
#[error("processor `{processor}` failed on tick {tick}: {cause}")]
pub struct ProcessorFailure {
    /// Name of the failing processor.
    pub processor: String,
    /// Tick number the failure happened on.
    pub tick: u64,
    /// What went wrong.
    pub cause: FailureCause,
}

impl ProcessorFailure {
    /// Check whether the failure was a panic.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self.cause, FailureCause::Panic(_))
    }
}
