//! Bounded job queue feeding the worker pool.
//!
//! The queue owns admission: it rejects work once it holds `capacity` jobs
//! and hands the rejected job back to the caller, who decides what to do with
//! it. Every admitted job posts the
//! queue's [`WakeSignal`](crate::sync::WakeSignal) once.

mod bounded;

pub use bounded::JobQueue;

use crate::core::BoxedJob;

/// Errors that can occur during queue operations.
///
/// Rejected jobs travel back inside the error so the caller keeps ownership.
#[derive(Debug)]
pub enum QueueError {
    /// Queue holds `capacity` jobs
    Full(BoxedJob),
    /// Queue is closed and not accepting new jobs
    Closed(BoxedJob),
}

impl QueueError {
    /// Recovers the rejected job.
    pub fn into_job(self) -> BoxedJob {
        match self {
            QueueError::Full(job) | QueueError::Closed(job) => job,
        }
    }
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::Full(_) => write!(f, "queue is full"),
            QueueError::Closed(_) => write!(f, "queue is closed"),
        }
    }
}

impl std::error::Error for QueueError {}

/// Result type for queue operations
pub type QueueResult<T> = std::result::Result<T, QueueError>;
