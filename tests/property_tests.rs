//! Property-based tests for thpool_server using proptest

use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thpool_server::prelude::*;
use thpool_server::queue::{JobQueue, QueueError};

// ============================================================================
// ThreadPoolConfig Tests
// ============================================================================

proptest! {
    /// Any non-zero sizes validate
    #[test]
    fn test_config_valid_sizes(threads in 1usize..64, capacity in 1usize..10_000) {
        let config = ThreadPoolConfig::new(threads).with_queue_capacity(capacity);
        prop_assert!(config.validate().is_ok());
    }

    /// A zero on either side is rejected
    #[test]
    fn test_config_zero_rejected(threads in 0usize..4, capacity in 0usize..4) {
        prop_assume!(threads == 0 || capacity == 0);
        let config = ThreadPoolConfig::new(threads).with_queue_capacity(capacity);
        let rejected = matches!(config.validate(), Err(ThreadError::InvalidArgument { .. }));
        prop_assert!(rejected);
    }

    /// Configs survive a trip through JSON
    #[test]
    fn test_config_json(threads in 1usize..64, capacity in 1usize..1000, prefix in "[a-z]{3,10}") {
        let config = ThreadPoolConfig::new(threads)
            .with_queue_capacity(capacity)
            .with_thread_name_prefix(prefix.clone());
        let json = serde_json::to_string(&config).unwrap();
        let back: ThreadPoolConfig = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.num_threads, threads);
        prop_assert_eq!(back.queue_capacity, capacity);
        prop_assert_eq!(back.thread_name_prefix, prefix);
    }
}

// ============================================================================
// JobQueue Tests
// ============================================================================

proptest! {
    /// Filling past capacity rejects exactly the overflow and leaves the
    /// accepted jobs in FIFO order
    #[test]
    fn test_queue_full_leaves_contents(capacity in 1usize..32, extra in 0usize..16) {
        let queue = JobQueue::new(capacity);
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let mut rejected = 0;
        for i in 0..capacity + extra {
            let order = Arc::clone(&order);
            match queue.enqueue(Box::new(ClosureJob::new(move || order.lock().push(i)))) {
                Ok(()) => {}
                Err(QueueError::Full(_)) => rejected += 1,
                Err(QueueError::Closed(_)) => prop_assert!(false, "queue closed"),
            }
        }
        prop_assert_eq!(rejected, extra);
        prop_assert_eq!(queue.len(), capacity);

        while let Some(mut job) = queue.dequeue() {
            job.execute();
        }
        let expected: Vec<usize> = (0..capacity).collect();
        prop_assert_eq!(&*order.lock(), &expected);
    }
}

// ============================================================================
// ThreadPool Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Up to `capacity` jobs submitted to a fresh pool are all accepted and
    /// each runs exactly once
    #[test]
    fn test_jobs_run_exactly_once(threads in 1usize..6, capacity in 1usize..64, fill in 0.0f64..=1.0) {
        let jobs = ((capacity as f64) * fill) as usize;
        let pool = ThreadPool::new(threads, capacity).unwrap();
        let counters: Arc<Vec<AtomicUsize>> =
            Arc::new((0..jobs).map(|_| AtomicUsize::new(0)).collect());

        for i in 0..jobs {
            let counters = Arc::clone(&counters);
            pool.execute(move || {
                counters[i].fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.wait_idle();

        for counter in counters.iter() {
            prop_assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
        prop_assert_eq!(pool.total_jobs_submitted(), jobs as u64);
        prop_assert_eq!(pool.total_jobs_processed(), jobs as u64);
        pool.shutdown().unwrap();
    }
}
