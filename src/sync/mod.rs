//! Synchronization primitives shared by the queue and the workers

mod wake_signal;

pub use wake_signal::WakeSignal;
