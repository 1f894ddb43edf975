//! Thread pool and worker implementations

mod state;
pub mod thread_pool;
pub mod worker;

pub use thread_pool::{PoolStats, ThreadPool, ThreadPoolConfig};
pub use worker::WorkerStats;
