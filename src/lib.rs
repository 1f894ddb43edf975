//! # thpool_server
//!
//! A fixed-size worker pool with a bounded job queue, and the small static
//! file server it was built for.
//!
//! ## Features
//!
//! - **Fixed pool**: exactly `num_workers` threads, spawned up front; the
//!   constructor returns only once every worker is alive
//! - **Bounded queue**: FIFO with fail-fast admission; a full queue returns
//!   [`ThreadError::QueueFull`] instead of blocking the producer
//! - **Drain**: [`ThreadPool::wait_idle`] blocks until the queue is empty and
//!   no job is running
//! - **Shutdown**: running jobs finish, every worker is joined, queued jobs
//!   are discarded
//! - **Panic isolation**: a panicking job is logged and counted; its worker
//!   keeps serving
//!
//! ## Quick Start
//!
//! ```rust
//! use thpool_server::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = ThreadPool::new(4, 100)?;
//!
//! for i in 0..10 {
//!     pool.execute(move || {
//!         println!("Job {} executing", i);
//!     })?;
//! }
//!
//! pool.wait_idle();
//! pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Backpressure
//!
//! ```rust
//! use thpool_server::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = ThreadPool::new(2, 8)?;
//!
//! match pool.execute(|| {}) {
//!     Ok(()) => {}
//!     Err(ThreadError::QueueFull { .. }) => println!("busy, try later"),
//!     Err(e) => return Err(e),
//! }
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Jobs
//!
//! ```rust
//! use thpool_server::prelude::*;
//!
//! struct Greet {
//!     name: String,
//! }
//!
//! impl Job for Greet {
//!     fn execute(&mut self) {
//!         println!("hello, {}", self.name);
//!     }
//!
//!     fn job_type(&self) -> &str {
//!         "Greet"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! # let pool = ThreadPool::new(2, 8)?;
//! pool.submit(Greet {
//!     name: "pool".to_string(),
//! })?;
//! # pool.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;
pub mod server;
pub mod sync;
pub mod tracing;

pub use crate::core::{BoxedJob, ClosureJob, Job, Result, ThreadError};
pub use crate::pool::{PoolStats, ThreadPool, ThreadPoolConfig, WorkerStats};
