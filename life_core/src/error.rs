//! Controller errors.

use thiserror::Error;

use world_rules::{CommitError, SnapshotError, ZoneId};

#[derive(Debug, Error)]
pub enum ControllerError {
    /// A commit failed earlier; only `retry_commit` or `reset_progress` can continue.
    #[error("Controller halted after a failed commit")]
    Halted,

    #[error("Commit failed: {0}")]
    CommitFailed(#[from] CommitError),

    #[error("Reset failed: {0}")]
    Reset(#[source] CommitError),

    #[error("Snapshot failed: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Zone not found: {0}")]
    UnknownZone(ZoneId),

    #[error("Zone is still locked: {0}")]
    ZoneLocked(ZoneId),

    #[error("A life is in progress")]
    LifeInProgress,

    #[error("No commit is pending")]
    NothingToRetry,
}
