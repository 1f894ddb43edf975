//! Tracing integration for observability.
//!
//! Structured spans and metric events are emitted when the `tracing` feature
//! is enabled. Without it, [`TracedJob`] is a transparent wrapper.
//!
//! # Example
//!
//! ```rust,ignore
//! use thpool_server::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("thpool_server=debug".parse().unwrap()))
//!     .init();
//!
//! let pool = ThreadPool::new(4, 100)?;
//! pool.submit_traced(MyJob::new())?;
//! ```

use crate::core::Job;

/// A job wrapper that propagates tracing context across thread boundaries.
///
/// The span current at submission time is entered again when a worker runs
/// the job, so events from the job body nest under the submitter's span.
pub struct TracedJob<J: Job> {
    inner: J,
    #[cfg(feature = "tracing")]
    span: tracing::Span,
}

impl<J: Job> TracedJob<J> {
    /// Wraps `job`, capturing the current span.
    pub fn new(job: J) -> Self {
        Self {
            inner: job,
            #[cfg(feature = "tracing")]
            span: tracing::Span::current(),
        }
    }

    /// Creates a TracedJob with a specific span.
    #[cfg(feature = "tracing")]
    pub fn with_span(job: J, span: tracing::Span) -> Self {
        Self { inner: job, span }
    }
}

impl<J: Job> Job for TracedJob<J> {
    fn execute(&mut self) {
        #[cfg(feature = "tracing")]
        let _guard = self.span.enter();
        self.inner.execute()
    }

    fn job_type(&self) -> &str {
        self.inner.job_type()
    }
}

/// Metrics recording functions for observability.
///
/// These emit trace events that a subscriber can turn into counters,
/// gauges and histograms.
#[cfg(feature = "tracing")]
pub mod metrics {
    use std::time::Duration;

    /// Records an accepted submission.
    #[inline]
    pub fn record_submission(queue_depth: usize) {
        tracing::trace!(
            counter.jobs_submitted = 1,
            gauge.queue_depth = queue_depth as i64,
            "job submitted"
        );
    }

    /// Records a submission refused because the queue was full.
    #[inline]
    pub fn record_rejection(capacity: usize) {
        tracing::trace!(
            counter.jobs_rejected = 1,
            queue_capacity = capacity,
            "job rejected"
        );
    }

    /// Records job completion with timing.
    #[inline]
    pub fn record_completion(duration: Duration) {
        tracing::trace!(
            counter.jobs_completed = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job completed"
        );
    }

    /// Records a job panic event.
    #[inline]
    pub fn record_panic(duration: Duration) {
        tracing::trace!(
            counter.jobs_panicked = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job panicked"
        );
    }

    /// Records worker becoming busy.
    #[inline]
    pub fn record_worker_busy(worker_id: usize) {
        tracing::trace!(gauge.workers_busy = 1, worker_id = worker_id, "worker busy");
    }

    /// Records worker becoming idle.
    #[inline]
    pub fn record_worker_idle(worker_id: usize) {
        tracing::trace!(
            gauge.workers_busy = -1i64,
            worker_id = worker_id,
            "worker idle"
        );
    }

    /// Records pool startup.
    #[inline]
    pub fn record_pool_start(num_workers: usize, queue_capacity: usize) {
        tracing::info!(
            workers = num_workers,
            queue_capacity = queue_capacity,
            "thread pool started"
        );
    }

    /// Records pool shutdown.
    #[inline]
    pub fn record_pool_shutdown(jobs_processed: u64, jobs_discarded: usize) {
        tracing::info!(
            jobs_processed = jobs_processed,
            jobs_discarded = jobs_discarded,
            "thread pool shutdown complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClosureJob;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_traced_job_executes() {
        let executed = Arc::new(AtomicBool::new(false));
        let executed_clone = executed.clone();

        let job = ClosureJob::new(move || {
            executed_clone.store(true, Ordering::SeqCst);
        });

        let mut traced = TracedJob::new(job);
        traced.execute();

        assert!(executed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_traced_job_preserves_job_type() {
        let job = ClosureJob::with_name(|| {}, "connection");
        let traced = TracedJob::new(job);

        assert_eq!(traced.job_type(), "connection");
    }
}
