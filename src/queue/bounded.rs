//! Bounded FIFO queue with capacity limit.

use super::{QueueError, QueueResult};
use crate::core::BoxedJob;
use crate::sync::WakeSignal;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug)]
struct QueueInner {
    jobs: VecDeque<BoxedJob>,
    closed: bool,
}

/// A bounded FIFO of jobs guarded by a single lock.
///
/// Enqueue never blocks: a full queue returns the job inside
/// [`QueueError::Full`].
///
/// # Example
///
/// ```rust
/// use thpool_server::queue::{JobQueue, QueueError};
/// use thpool_server::core::ClosureJob;
///
/// let queue = JobQueue::new(2);
///
/// queue.enqueue(Box::new(ClosureJob::new(|| {}))).unwrap();
/// queue.enqueue(Box::new(ClosureJob::new(|| {}))).unwrap();
///
/// // Queue is now full
/// match queue.enqueue(Box::new(ClosureJob::new(|| {}))) {
///     Err(QueueError::Full(_)) => println!("Queue is full"),
///     _ => panic!("expected Full error"),
/// }
/// ```
#[derive(Debug)]
pub struct JobQueue {
    inner: Mutex<QueueInner>,
    capacity: usize,
    has_jobs: Arc<WakeSignal>,
}

impl JobQueue {
    /// Creates a new bounded queue with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        Self {
            inner: Mutex::new(QueueInner {
                jobs: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            has_jobs: Arc::new(WakeSignal::new()),
        }
    }

    /// Appends a job to the tail and posts the wake signal once.
    pub fn enqueue(&self, job: BoxedJob) -> QueueResult<()> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(QueueError::Closed(job));
        }
        if inner.jobs.len() >= self.capacity {
            return Err(QueueError::Full(job));
        }
        inner.jobs.push_back(job);
        self.has_jobs.post();
        Ok(())
    }

    /// Removes the head job, or returns `None` when the queue is empty.
    ///
    /// Re-posts the wake signal while jobs remain: one `post` wakes a single
    /// worker, so without it the other idle workers would never hear about
    /// the rest of the backlog.
    pub fn dequeue(&self) -> Option<BoxedJob> {
        let mut inner = self.inner.lock();
        let job = inner.jobs.pop_front();
        if !inner.jobs.is_empty() {
            self.has_jobs.post();
        }
        job
    }

    /// Drops every pending job and resets the wake signal.
    ///
    /// Returns the number of jobs discarded.
    pub fn clear(&self) -> usize {
        let drained: Vec<BoxedJob> = {
            let mut inner = self.inner.lock();
            let drained = inner.jobs.drain(..).collect();
            self.has_jobs.reset();
            drained
        };
        // Job destructors run outside the lock
        drained.len()
    }

    /// Stops accepting new jobs. Jobs already queued stay put.
    pub fn close(&self) {
        self.inner.lock().closed = true;
    }

    /// Whether the queue rejects new jobs.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Number of jobs currently queued.
    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    /// Whether no job is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().jobs.is_empty()
    }

    /// Returns the maximum capacity of this queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The signal posted whenever a job becomes available.
    pub fn wake_signal(&self) -> &Arc<WakeSignal> {
        &self.has_jobs
    }
}
