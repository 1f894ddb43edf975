//! Server configuration from the command line and environment.
//!
//! ```bash
//! thpool-server --port 8080 --root ./public --workers 8 --queue-capacity 200
//! THPOOL_PORT=8080 THPOOL_ROOT=./public thpool-server
//! thpool-server --config pool.json   # {"num_threads": 8, "queue_capacity": 200}
//! ```

use super::ServerError;
use crate::pool::ThreadPoolConfig;
use clap::Parser;
use std::path::PathBuf;

/// Static file server backed by a fixed worker pool
#[derive(Debug, Clone, Parser)]
#[command(name = "thpool-server", version)]
pub struct ServerConfig {
    /// Host/IP to listen on
    #[arg(long, default_value = "127.0.0.1", env = "THPOOL_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080, env = "THPOOL_PORT")]
    pub port: u16,

    /// Directory files are served from
    #[arg(long, default_value = ".", env = "THPOOL_ROOT")]
    pub root: PathBuf,

    /// Number of worker threads
    #[arg(short, long, default_value_t = 4, env = "THPOOL_WORKERS")]
    pub workers: usize,

    /// Connections that may wait for a worker before new ones get 503
    #[arg(long = "queue-capacity", default_value_t = 100, env = "THPOOL_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// JSON pool configuration; overrides --workers and --queue-capacity
    #[arg(long, env = "THPOOL_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            root: PathBuf::from("."),
            workers: 4,
            queue_capacity: 100,
            config: None,
        }
    }
}

impl ServerConfig {
    /// `host:port` to bind
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pool settings, read from `--config` when given
    pub fn pool_config(&self) -> Result<ThreadPoolConfig, ServerError> {
        match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                serde_json::from_str(&text).map_err(|source| ServerError::Config {
                    path: path.clone(),
                    source,
                })
            }
            None => Ok(ThreadPoolConfig::new(self.workers)
                .with_queue_capacity(self.queue_capacity)
                .with_thread_name_prefix("http-worker")),
        }
    }
}
