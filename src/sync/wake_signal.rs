//! Binary semaphore used to wake idle workers.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct WakeState {
    signaled: bool,
    /// Bumped by every `post_all`; lets broadcast-woken waiters leave without
    /// consuming the signal.
    epoch: u64,
}

/// A level-triggered wake primitive with two states, idle and signaled.
///
/// [`post`](WakeSignal::post) lets exactly one waiter through and consumes the
/// signal. [`post_all`](WakeSignal::post_all) releases every thread blocked at
/// the time of the call and leaves the signal set for the next arrival.
///
/// A thread returning from [`wait`](WakeSignal::wait) knows only that it was
/// woken. It must re-read whatever state it cares about (queue contents, the
/// pool's keepalive flag) before acting.
///
/// # Example
///
/// ```rust
/// use thpool_server::sync::WakeSignal;
///
/// let signal = WakeSignal::new();
/// signal.post();
/// assert!(signal.is_signaled());
/// signal.wait();
/// assert!(!signal.is_signaled());
/// ```
#[derive(Debug, Default)]
pub struct WakeSignal {
    state: Mutex<WakeState>,
    condvar: Condvar,
}

impl WakeSignal {
    /// Creates a signal in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the signal and wakes at most one blocked waiter.
    pub fn post(&self) {
        let mut state = self.state.lock();
        state.signaled = true;
        drop(state);
        self.condvar.notify_one();
    }

    /// Sets the signal and wakes every blocked waiter.
    pub fn post_all(&self) {
        let mut state = self.state.lock();
        state.signaled = true;
        state.epoch = state.epoch.wrapping_add(1);
        drop(state);
        self.condvar.notify_all();
    }

    /// Blocks until the signal is posted.
    ///
    /// Returns after consuming a `post`, or after a `post_all` issued while
    /// this thread was blocked.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        let entered_at = state.epoch;
        loop {
            if state.signaled {
                state.signaled = false;
                return;
            }
            if state.epoch != entered_at {
                return;
            }
            self.condvar.wait(&mut state);
        }
    }

    /// Returns the signal to the idle state without waking anyone.
    pub fn reset(&self) {
        self.state.lock().signaled = false;
    }

    /// Whether the signal is currently set.
    pub fn is_signaled(&self) -> bool {
        self.state.lock().signaled
    }
}
