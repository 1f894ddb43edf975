//! End-to-end scenarios for the pool: load, capacity limits and lifecycle

use crossbeam_channel::bounded;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use thpool_server::prelude::*;

/// Submit, retrying while the queue is full
fn submit_with_retry<F>(pool: &ThreadPool, f: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let f = Arc::new(f);
    loop {
        let job = Arc::clone(&f);
        match pool.execute(move || job()) {
            Ok(()) => return,
            Err(ThreadError::QueueFull { .. }) => thread::yield_now(),
            Err(e) => panic!("unexpected submit error: {}", e),
        }
    }
}

#[test]
fn test_stress_every_job_runs_once() {
    const PRODUCERS: usize = 20;
    const JOBS_PER_PRODUCER: usize = 50;

    let pool = Arc::new(ThreadPool::new(4, 100).unwrap());
    let seen = Arc::new(Mutex::new(HashSet::new()));
    let runs = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let pool = Arc::clone(&pool);
            let seen = Arc::clone(&seen);
            let runs = Arc::clone(&runs);
            thread::spawn(move || {
                for j in 0..JOBS_PER_PRODUCER {
                    let id = p * JOBS_PER_PRODUCER + j;
                    let seen = Arc::clone(&seen);
                    let runs = Arc::clone(&runs);
                    submit_with_retry(&pool, move || {
                        seen.lock().insert(id);
                        runs.fetch_add(1, Ordering::SeqCst);
                    });
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    pool.wait_idle();

    assert_eq!(runs.load(Ordering::SeqCst), PRODUCERS * JOBS_PER_PRODUCER);
    assert_eq!(seen.lock().len(), PRODUCERS * JOBS_PER_PRODUCER);
    assert_eq!(pool.working_count(), 0);
    assert_eq!(pool.queue_len(), 0);
    assert_eq!(
        pool.total_jobs_processed(),
        (PRODUCERS * JOBS_PER_PRODUCER) as u64
    );

    pool.shutdown().unwrap();
}

#[test]
fn test_full_queue_rejects_then_drains() {
    let pool = ThreadPool::new(2, 2).unwrap();
    let (started_tx, started_rx) = bounded(2);
    let release = Arc::new(Barrier::new(3));

    // Occupy both workers
    for _ in 0..2 {
        let started_tx = started_tx.clone();
        let release = Arc::clone(&release);
        pool.execute(move || {
            started_tx.send(()).unwrap();
            release.wait();
        })
        .unwrap();
    }
    for _ in 0..2 {
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
    assert_eq!(pool.working_count(), 2);

    let ran = Arc::new(AtomicUsize::new(0));
    for _ in 0..2 {
        let ran = Arc::clone(&ran);
        pool.execute(move || {
            ran.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }
    assert_eq!(pool.queue_len(), 2);

    let result = pool.execute(|| {});
    assert!(matches!(
        result,
        Err(ThreadError::QueueFull { current: 2, max: 2 })
    ));
    assert_eq!(pool.queue_len(), 2);
    assert_eq!(pool.total_jobs_rejected(), 1);

    release.wait();
    pool.wait_idle();

    assert_eq!(ran.load(Ordering::SeqCst), 2);
    pool.shutdown().unwrap();
}

#[test]
fn test_lifecycle_counts() {
    let pool = ThreadPool::new(4, 10).unwrap();
    assert_eq!(pool.alive_count(), 4);
    assert_eq!(pool.working_count(), 0);
    assert!(pool.is_running());

    pool.shutdown().unwrap();
    assert_eq!(pool.alive_count(), 0);
    assert!(!pool.is_running());

    // Second shutdown is a no-op
    pool.shutdown().unwrap();
}

#[test]
fn test_invalid_sizes_rejected() {
    assert!(matches!(
        ThreadPool::new(0, 10),
        Err(ThreadError::InvalidArgument { .. })
    ));
    assert!(matches!(
        ThreadPool::new(4, 0),
        Err(ThreadError::InvalidArgument { .. })
    ));
}

#[test]
fn test_wait_idle_on_fresh_pool_returns() {
    let pool = ThreadPool::new(3, 5).unwrap();
    pool.wait_idle();
    assert_eq!(pool.working_count(), 0);
}

#[test]
fn test_shutdown_discards_queued_jobs() {
    let pool = ThreadPool::new(1, 10).unwrap();
    let (started_tx, started_rx) = bounded(1);
    let (release_tx, release_rx) = bounded::<()>(1);

    pool.execute(move || {
        started_tx.send(()).unwrap();
        release_rx.recv().unwrap();
    })
    .unwrap();
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    for _ in 0..5 {
        let ran = Arc::clone(&ran);
        pool.execute(move || {
            ran.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        release_tx.send(()).unwrap();
    });
    pool.shutdown().unwrap();
    releaser.join().unwrap();

    // The running job finished; the queued ones never started
    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(pool.queue_len(), 0);
    assert_eq!(pool.total_jobs_processed(), 1);
    assert!(matches!(
        pool.execute(|| {}),
        Err(ThreadError::ShuttingDown { .. })
    ));
}

#[test]
fn test_wait_idle_unblocked_by_shutdown() {
    let pool = Arc::new(ThreadPool::new(1, 10).unwrap());
    let (release_tx, release_rx) = bounded::<()>(1);

    pool.execute(move || {
        let _ = release_rx.recv();
    })
    .unwrap();
    pool.execute(|| {}).unwrap();

    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.wait_idle())
    };

    thread::sleep(Duration::from_millis(20));
    release_tx.send(()).unwrap();
    pool.shutdown().unwrap();
    waiter.join().unwrap();
}
