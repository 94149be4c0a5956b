use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::models::ConflictSet;

/// Failure of the remote commit call. Always triggers a rollback of the
/// optimistic change before it is surfaced; never retried automatically.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommitError {
    /// The backend answered but refused the change.
    #[error("backend rejected the change: {0}")]
    Rejected(String),

    /// The request never got a usable answer.
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("commit timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CalendarError {
    #[error("appointment end must be after its start")]
    InvalidInterval,

    #[error("appointment is too short: {minutes} min (minimum {min_minutes} min)")]
    DurationTooShort { minutes: i64, min_minutes: i64 },

    #[error("appointment is too long: {minutes} min (maximum {max_minutes} min)")]
    DurationTooLong { minutes: i64, max_minutes: i64 },

    /// Recoverable: the caller presents the conflicting appointments and
    /// lets the user override or abandon the change.
    #[error("proposed time overlaps {} existing appointment(s)", .0.len())]
    ConflictDetected(ConflictSet),

    #[error("no appointment with id {0} in the loaded window")]
    UnknownInterval(Uuid),

    #[error("a change for appointment {0} is still being saved")]
    MutationInFlight(Uuid),

    #[error(transparent)]
    Commit(#[from] CommitError),
}
