//! Error types for the thread pool

/// Result type for thread pool operations
pub type Result<T> = std::result::Result<T, ThreadError>;

/// Errors that can occur in the thread pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ThreadError {
    /// A construction parameter was out of range; no pool was created
    #[error("Invalid argument '{parameter}': {message}")]
    InvalidArgument {
        /// Name of the offending parameter
        parameter: String,
        /// Error message
        message: String,
    },

    /// Queue is full with capacity details
    #[error("Job queue is full: {current}/{max} jobs queued")]
    QueueFull {
        /// Current queue size
        current: usize,
        /// Maximum queue size
        max: usize,
    },

    /// Thread pool is shutting down with job count
    #[error("Thread pool is shutting down ({pending_jobs} jobs pending)")]
    ShuttingDown {
        /// Number of pending jobs
        pending_jobs: usize,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{thread_id}: {message}")]
    SpawnError {
        /// ID of the thread that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// A worker thread terminated abnormally
    #[error("Failed to join worker thread #{thread_id}: {message}")]
    JoinError {
        /// ID of the thread that failed to join
        thread_id: usize,
        /// Error message
        message: String,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl ThreadError {
    /// Create an invalid argument error
    pub fn invalid_argument(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ThreadError::InvalidArgument {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a queue full error
    pub fn queue_full(current: usize, max: usize) -> Self {
        ThreadError::QueueFull { current, max }
    }

    /// Create a shutting down error
    pub fn shutting_down(pending_jobs: usize) -> Self {
        ThreadError::ShuttingDown { pending_jobs }
    }

    /// Create a spawn error
    pub fn spawn(thread_id: usize, message: impl Into<String>) -> Self {
        ThreadError::SpawnError {
            thread_id,
            message: message.into(),
            source: None,
        }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ThreadError::SpawnError {
            thread_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_id: usize, message: impl Into<String>) -> Self {
        ThreadError::JoinError {
            thread_id,
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ThreadError::Other(msg.into())
    }

    /// Whether the caller may retry the operation later
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ThreadError::QueueFull { .. })
    }
}
