//! Thread pool implementation

use crate::core::{BoxedJob, ClosureJob, Job, Result, ThreadError};
use crate::pool::state::PoolState;
use crate::pool::worker::{Worker, WorkerStats};
use crate::queue::QueueError;
use crate::tracing::TracedJob;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Configuration for thread pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadPoolConfig {
    /// Number of worker threads
    pub num_threads: usize,
    /// Maximum number of queued jobs
    pub queue_capacity: usize,
    /// Thread name prefix
    pub thread_name_prefix: String,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: 4,
            queue_capacity: 100,
            thread_name_prefix: "worker".to_string(),
        }
    }
}

impl ThreadPoolConfig {
    /// Create a new configuration with specified number of threads
    #[must_use]
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Default::default()
        }
    }

    /// Set maximum queue size
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(ThreadError::invalid_argument(
                "num_threads",
                "Number of threads must be greater than 0",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ThreadError::invalid_argument(
                "queue_capacity",
                "Queue capacity must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Point-in-time view of a pool's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Workers the pool was built with
    pub num_workers: usize,
    /// Workers whose thread is running
    pub alive: usize,
    /// Workers currently executing a job
    pub working: usize,
    /// Jobs waiting in the queue
    pub queued: usize,
    /// Queue capacity
    pub queue_capacity: usize,
    /// Jobs accepted by `submit`
    pub jobs_submitted: u64,
    /// Jobs refused with `QueueFull`
    pub jobs_rejected: u64,
    /// Jobs that ran to completion
    pub jobs_processed: u64,
    /// Jobs that panicked
    pub jobs_panicked: u64,
}

/// A fixed-size pool of worker threads fed by a bounded queue
///
/// # Startup
///
/// Construction spawns every worker and returns only once all of them report
/// alive, so a submission never races a half-built pool.
///
/// # Backpressure
///
/// Submission never blocks. When the queue holds `queue_capacity` jobs the
/// job is refused with [`ThreadError::QueueFull`] and the caller picks the
/// policy.
///
/// # Shutdown
///
/// [`shutdown`](ThreadPool::shutdown) lets running jobs finish, joins every
/// worker and discards whatever is still queued. Dropping the pool does the
/// same. Calling `shutdown` from inside a job deadlocks, as the worker would
/// wait on itself.
///
/// # Example
///
/// ```rust
/// use thpool_server::prelude::*;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// # fn main() -> Result<()> {
/// let pool = ThreadPool::new(4, 16)?;
/// let counter = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..8 {
///     let counter = Arc::clone(&counter);
///     pool.execute(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     })?;
/// }
///
/// pool.wait_idle();
/// assert_eq!(counter.load(Ordering::SeqCst), 8);
/// pool.shutdown()?;
/// # Ok(())
/// # }
/// ```
pub struct ThreadPool {
    config: ThreadPoolConfig,
    state: Arc<PoolState>,
    workers: Mutex<Vec<Worker>>,
    worker_stats: Vec<Arc<WorkerStats>>,
    total_jobs_submitted: AtomicU64,
    total_jobs_rejected: AtomicU64,
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .field("alive", &self.alive_count())
            .field("working", &self.working_count())
            .field("queued", &self.queue_len())
            .finish()
    }
}

impl ThreadPool {
    /// Create a pool of `num_workers` threads with room for `queue_capacity`
    /// pending jobs
    ///
    /// # Errors
    ///
    /// - `ThreadError::InvalidArgument` - `num_workers` or `queue_capacity` is 0
    /// - `ThreadError::SpawnError` - a worker thread could not be created
    pub fn new(num_workers: usize, queue_capacity: usize) -> Result<Self> {
        Self::with_config(ThreadPoolConfig::new(num_workers).with_queue_capacity(queue_capacity))
    }

    /// Create a thread pool with custom configuration
    pub fn with_config(config: ThreadPoolConfig) -> Result<Self> {
        Self::start(config, Worker::new)
    }

    /// Build the pool, creating each worker with `spawn`
    fn start<S>(config: ThreadPoolConfig, mut spawn: S) -> Result<Self>
    where
        S: FnMut(usize, &str, Arc<PoolState>) -> Result<Worker>,
    {
        config.validate()?;

        let state = Arc::new(PoolState::new(config.queue_capacity));

        let mut workers = Vec::with_capacity(config.num_threads);
        for id in 0..config.num_threads {
            match spawn(id, &config.thread_name_prefix, Arc::clone(&state)) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    log::error!(
                        "pool '{}': {}; stopping {} spawned workers",
                        config.thread_name_prefix,
                        e,
                        workers.len()
                    );
                    if let Err(join_err) = Self::terminate(&state, workers) {
                        log::error!("rollback after spawn failure: {}", join_err);
                    }
                    return Err(e);
                }
            }
        }

        // Startup barrier
        state.wait_for_alive(config.num_threads);

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(config.num_threads, config.queue_capacity);
        log::info!(
            "pool '{}' started: {} workers, queue capacity {}",
            config.thread_name_prefix,
            config.num_threads,
            config.queue_capacity
        );

        let worker_stats = workers.iter().map(Worker::stats).collect();
        Ok(Self {
            config,
            state,
            workers: Mutex::new(workers),
            worker_stats,
            total_jobs_submitted: AtomicU64::new(0),
            total_jobs_rejected: AtomicU64::new(0),
        })
    }

    /// Submit a job to the pool
    ///
    /// Never blocks.
    ///
    /// # Errors
    ///
    /// - `ThreadError::QueueFull` - the queue is at capacity; the job is dropped
    /// - `ThreadError::ShuttingDown` - shutdown has started
    pub fn submit<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.submit_boxed(Box::new(job))
    }

    /// Submit an already boxed job
    pub fn submit_boxed(&self, job: BoxedJob) -> Result<()> {
        match self.state.queue.enqueue(job) {
            Ok(()) => {
                self.total_jobs_submitted.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_submission(self.state.queue.len());
                Ok(())
            }
            Err(QueueError::Full(_)) => {
                self.total_jobs_rejected.fetch_add(1, Ordering::Relaxed);
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_rejection(self.config.queue_capacity);
                Err(ThreadError::queue_full(
                    self.config.queue_capacity,
                    self.config.queue_capacity,
                ))
            }
            Err(QueueError::Closed(_)) => Err(ThreadError::shutting_down(self.state.queue.len())),
        }
    }

    /// Submit a job that runs inside the caller's current tracing span
    pub fn submit_traced<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.submit(TracedJob::new(job))
    }

    /// Submit a closure
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(ClosureJob::new(f))
    }

    /// Submit `action` to be called with `arg` on a worker thread
    ///
    /// The argument moves into the job and is owned by it until the action
    /// returns.
    pub fn execute_with<F, A>(&self, action: F, arg: A) -> Result<()>
    where
        F: FnOnce(A) + Send + 'static,
        A: Send + 'static,
    {
        self.execute(move || action(arg))
    }

    /// Block until the queue is empty and no worker is running a job
    pub fn wait_idle(&self) {
        self.state.wait_idle();
    }

    /// Number of workers currently running a job
    pub fn working_count(&self) -> usize {
        self.state.working_count()
    }

    /// Number of worker threads still running
    pub fn alive_count(&self) -> usize {
        self.state.alive_count()
    }

    /// Number of workers the pool was built with
    pub fn num_workers(&self) -> usize {
        self.config.num_threads
    }

    /// Jobs waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.state.queue.len()
    }

    /// Maximum number of queued jobs
    pub fn queue_capacity(&self) -> usize {
        self.config.queue_capacity
    }

    /// Whether the pool still accepts work
    pub fn is_running(&self) -> bool {
        self.state.keepalive()
    }

    /// Get the configuration the pool was built with
    pub fn config(&self) -> &ThreadPoolConfig {
        &self.config
    }

    /// Get total jobs accepted
    pub fn total_jobs_submitted(&self) -> u64 {
        self.total_jobs_submitted.load(Ordering::Relaxed)
    }

    /// Get total jobs refused because the queue was full
    pub fn total_jobs_rejected(&self) -> u64 {
        self.total_jobs_rejected.load(Ordering::Relaxed)
    }

    /// Get per-worker statistics
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.worker_stats.clone()
    }

    /// Get total jobs processed across all workers
    pub fn total_jobs_processed(&self) -> u64 {
        self.worker_stats
            .iter()
            .map(|s| s.get_jobs_processed())
            .sum()
    }

    /// Get total jobs panicked across all workers
    pub fn total_jobs_panicked(&self) -> u64 {
        self.worker_stats.iter().map(|s| s.get_jobs_panicked()).sum()
    }

    /// Snapshot of every counter the pool keeps
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            num_workers: self.num_workers(),
            alive: self.alive_count(),
            working: self.working_count(),
            queued: self.queue_len(),
            queue_capacity: self.queue_capacity(),
            jobs_submitted: self.total_jobs_submitted(),
            jobs_rejected: self.total_jobs_rejected(),
            jobs_processed: self.total_jobs_processed(),
            jobs_panicked: self.total_jobs_panicked(),
        }
    }

    /// Shutdown the thread pool and wait for all workers to finish
    ///
    /// 1. Clears keepalive and closes the queue, so new submissions fail
    /// 2. Wakes every idle worker
    /// 3. Joins each worker; a worker mid-job finishes that job first
    /// 4. Discards jobs still queued
    ///
    /// Concurrent callers block until the first one has finished. Later
    /// calls return `Ok(())` immediately.
    pub fn shutdown(&self) -> Result<()> {
        let mut workers = self.workers.lock();
        if workers.is_empty() {
            return Ok(());
        }

        let result = Self::terminate(&self.state, std::mem::take(&mut *workers));

        let discarded = self.state.queue.clear();
        self.state.notify_idle();

        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_shutdown(self.total_jobs_processed(), discarded);
        if discarded > 0 {
            log::warn!(
                "pool '{}' shut down, {} queued jobs discarded",
                self.config.thread_name_prefix,
                discarded
            );
        } else {
            log::info!("pool '{}' shut down", self.config.thread_name_prefix);
        }

        result
    }

    /// Stop and join `workers`, reporting the first join failure
    fn terminate(state: &PoolState, workers: Vec<Worker>) -> Result<()> {
        state.begin_shutdown();

        let mut first_error = None;
        for worker in workers {
            let id = worker.id();
            if let Err(e) = worker.join() {
                log::error!("worker {} did not exit cleanly: {}", id, e);
                first_error.get_or_insert(e);
            }
        }

        // Every joined thread has reported dead
        state.wait_for_alive(0);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!(
                "failed to shut down pool '{}' during drop: {}",
                self.config.thread_name_prefix,
                e
            );
        }
    }
}
