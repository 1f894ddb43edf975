//! Static file server entry point
//!
//! Run with: cargo run --bin thpool-server -- --root ./public --workers 8

use clap::Parser;
use thpool_server::server::{Server, ServerConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();
    log::info!(
        "serving {} on {}",
        config.root.display(),
        config.address()
    );

    let server = match Server::bind(&config) {
        Ok(server) => server,
        Err(e) => {
            log::error!("failed to start: {}", e);
            std::process::exit(1);
        }
    };

    // Stop accepting and drain running jobs on SIGINT, SIGTERM, SIGQUIT, SIGHUP
    #[cfg(unix)]
    match server.shutdown_handle() {
        Ok(handle) => {
            if let Err(e) = handle.shutdown_on_signals() {
                log::warn!("cannot install signal handlers: {}", e);
            }
        }
        Err(e) => log::warn!("cannot create shutdown handle: {}", e),
    }

    if let Err(e) = server.run() {
        log::error!("server stopped with error: {}", e);
        std::process::exit(1);
    }
}
