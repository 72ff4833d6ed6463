//! Error types for store dispatch.

use thiserror::Error;

/// Reasons an asynchronous dispatch can be refused.
///
/// Synchronous dispatch never fails; a panicking reducer propagates to the
/// caller instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The store has been shut down and no longer accepts async actions.
    #[error("store has been shut down")]
    ShutDown,

    /// The bounded async queue already holds `capacity` pending actions.
    #[error("dispatch queue is full ({capacity} pending actions)")]
    QueueFull { capacity: usize },

    /// The background worker could not be started.
    #[error("failed to spawn dispatch worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    /// The background worker panicked and stopped processing actions.
    #[error("dispatch worker terminated after a reducer or subscriber panic")]
    WorkerGone,
}
