//! State shared between a pool and its workers

use crate::core::BoxedJob;
use crate::queue::JobQueue;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

/// Lifecycle counters, always updated under one lock.
///
/// `working <= alive <= num_workers` holds whenever the lock is released.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) alive: usize,
    pub(crate) working: usize,
}

/// Everything a worker needs from its pool.
///
/// Lock order is counters, then queue. Nothing takes the counters lock while
/// holding the queue lock.
#[derive(Debug)]
pub(crate) struct PoolState {
    pub(crate) queue: JobQueue,
    keepalive: AtomicBool,
    counters: Mutex<Counters>,
    /// Signalled whenever `alive` changes
    lifecycle: Condvar,
    /// Signalled when `working` drops to zero or the queue is cleared
    idle: Condvar,
}

impl PoolState {
    pub(crate) fn new(queue_capacity: usize) -> Self {
        Self {
            queue: JobQueue::new(queue_capacity),
            keepalive: AtomicBool::new(true),
            counters: Mutex::new(Counters::default()),
            lifecycle: Condvar::new(),
            idle: Condvar::new(),
        }
    }

    pub(crate) fn keepalive(&self) -> bool {
        self.keepalive.load(Ordering::SeqCst)
    }

    /// Clears keepalive, closes the queue and wakes every idle worker.
    pub(crate) fn begin_shutdown(&self) {
        self.keepalive.store(false, Ordering::SeqCst);
        self.queue.close();
        self.queue.wake_signal().post_all();
    }

    pub(crate) fn mark_alive(&self) {
        let mut counters = self.counters.lock();
        counters.alive += 1;
        self.lifecycle.notify_all();
    }

    pub(crate) fn mark_dead(&self) {
        let mut counters = self.counters.lock();
        counters.alive -= 1;
        self.lifecycle.notify_all();
    }

    /// Blocks until exactly `target` workers report alive.
    pub(crate) fn wait_for_alive(&self, target: usize) {
        let mut counters = self.counters.lock();
        while counters.alive != target {
            self.lifecycle.wait(&mut counters);
        }
    }

    /// Dequeues a job and counts the caller as working, in one step.
    ///
    /// Returns `None` when another worker got there first.
    pub(crate) fn begin_job(&self) -> Option<BoxedJob> {
        let mut counters = self.counters.lock();
        let job = self.queue.dequeue()?;
        counters.working += 1;
        Some(job)
    }

    pub(crate) fn finish_job(&self) {
        let mut counters = self.counters.lock();
        counters.working -= 1;
        if counters.working == 0 {
            self.idle.notify_all();
        }
    }

    /// Blocks until the queue is empty and no job is running.
    pub(crate) fn wait_idle(&self) {
        let mut counters = self.counters.lock();
        while counters.working > 0 || !self.queue.is_empty() {
            self.idle.wait(&mut counters);
        }
    }

    /// Wakes `wait_idle` callers after the backlog was discarded.
    pub(crate) fn notify_idle(&self) {
        let _counters = self.counters.lock();
        self.idle.notify_all();
    }

    pub(crate) fn alive_count(&self) -> usize {
        self.counters.lock().alive
    }

    pub(crate) fn working_count(&self) -> usize {
        self.counters.lock().working
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClosureJob;

    #[test]
    fn test_begin_job_counts_only_real_jobs() {
        let state = PoolState::new(4);
        assert!(state.begin_job().is_none());
        assert_eq!(state.working_count(), 0);

        state.queue.enqueue(Box::new(ClosureJob::new(|| {}))).unwrap();
        let job = state.begin_job();
        assert!(job.is_some());
        assert_eq!(state.working_count(), 1);

        state.finish_job();
        assert_eq!(state.working_count(), 0);
    }

    #[test]
    fn test_wait_idle_returns_when_drained() {
        let state = PoolState::new(4);
        state.wait_idle();
    }

    #[test]
    fn test_begin_shutdown() {
        let state = PoolState::new(4);
        assert!(state.keepalive());

        state.begin_shutdown();
        assert!(!state.keepalive());
        assert!(state.queue.is_closed());
        assert!(state.queue.wake_signal().is_signaled());
    }

    #[test]
    fn test_alive_tracking() {
        let state = PoolState::new(1);
        state.mark_alive();
        state.mark_alive();
        state.wait_for_alive(2);
        assert_eq!(state.alive_count(), 2);

        state.mark_dead();
        state.mark_dead();
        state.wait_for_alive(0);
    }
}
