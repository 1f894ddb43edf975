//! Worker thread implementation

use crate::core::{BoxedJob, Result, ThreadError};
use crate::pool::state::PoolState;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

#[cfg(feature = "tracing")]
use tracing::{debug, span, Level};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of jobs that ran to completion
    pub jobs_processed: AtomicU64,
    /// Total number of jobs that panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent processing jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment jobs processed counter
    pub fn increment_processed(&self) {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs panicked counter
    pub fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total jobs processed
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Get average processing time per job in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.get_jobs_processed() + self.get_jobs_panicked();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// A worker thread that runs jobs from its pool's queue
///
/// # Lifecycle
///
/// A worker reports alive as soon as its thread starts, then loops: wait
/// for the wake signal, re-check keepalive, take one job and run it to
/// completion. Once keepalive is cleared it re-posts the wake signal for
/// any other sleeper, reports dead and returns.
#[derive(Debug)]
pub(crate) struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a worker thread named `{name_prefix}-{id}`
    pub(crate) fn new(id: usize, name_prefix: &str, state: Arc<PoolState>) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);

        let thread = thread::Builder::new()
            .name(format!("{}-{}", name_prefix, id))
            .spawn(move || {
                Self::run(id, state, stats_clone);
            })
            .map_err(|e| ThreadError::spawn_with_source(id, "cannot create thread", e))?;

        Ok(Self {
            id,
            thread: Some(thread),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Join the worker thread
    pub(crate) fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| ThreadError::join(self.id, "Worker panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop
    fn run(id: usize, state: Arc<PoolState>, stats: Arc<WorkerStats>) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        state.mark_alive();
        let _alive = AliveGuard { state: &state };
        log::debug!("worker {} started", id);

        let wake = Arc::clone(state.queue.wake_signal());
        while state.keepalive() {
            wake.wait();

            if !state.keepalive() {
                break;
            }

            let Some(job) = state.begin_job() else {
                // Another worker took it
                continue;
            };

            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_worker_busy(id);

            {
                let _working = WorkingGuard { state: &state };
                Self::execute_job(id, job, &stats);
            }

            #[cfg(feature = "tracing")]
            crate::tracing::metrics::record_worker_idle(id);
        }

        #[cfg(feature = "tracing")]
        debug!(
            jobs_processed = stats.get_jobs_processed(),
            jobs_panicked = stats.get_jobs_panicked(),
            "worker shutting down"
        );
        log::debug!(
            "worker {} exiting after {} jobs",
            id,
            stats.get_jobs_processed()
        );
    }

    /// Execute and drop a single job with panic protection
    ///
    /// The job is dropped inside `catch_unwind`, so a panicking destructor
    /// counts as a panicked job rather than killing the worker.
    fn execute_job(id: usize, mut job: BoxedJob, stats: &WorkerStats) {
        let job_type = job.job_type().to_string();

        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job_type = job_type.as_str());
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();

        let start = std::time::Instant::now();

        let panic_result = catch_unwind(AssertUnwindSafe(move || {
            job.execute();
            drop(job);
        }));

        let elapsed = start.elapsed();

        match panic_result {
            Ok(()) => {
                stats.increment_processed();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_completion(elapsed);
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_panic(elapsed);
                log::error!("worker {}: job {} panicked: {}", id, job_type, panic_msg);
                stats.increment_panicked();
            }
        }

        stats.add_processing_time(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
    }
}

/// Takes the worker off the `working` count once its job is gone, by any path.
struct WorkingGuard<'a> {
    state: &'a PoolState,
}

impl Drop for WorkingGuard<'_> {
    fn drop(&mut self) {
        self.state.finish_job();
    }
}

/// Reports the worker dead when its thread leaves `run`, by any path.
struct AliveGuard<'a> {
    state: &'a PoolState,
}

impl Drop for AliveGuard<'_> {
    fn drop(&mut self) {
        // Hand the shutdown wake on to any worker that blocked after the broadcast
        self.state.queue.wake_signal().post();
        self.state.mark_dead();
    }
}
