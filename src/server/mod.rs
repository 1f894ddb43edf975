//! A small static file server driving the pool.
//!
//! The accept loop wraps each connection in one job. The job owns the
//! `TcpStream` and closes it by dropping it on every exit path. When the
//! pool's queue is full the connection is answered with
//! `503 Service Unavailable` on the accept thread and closed.

pub mod config;
pub mod request;
pub mod response;

pub use config::ServerConfig;
pub use request::{resolve_path, Method, RequestError, RequestLine, Version};
pub use response::{content_type_for, Response, Status};

use crate::core::{ClosureJob, ThreadError};
use crate::pool::ThreadPool;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(unix)]
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM},
    iterator::Signals,
};
#[cfg(unix)]
use std::thread;

/// Signals that stop the server gracefully
#[cfg(unix)]
pub const SHUTDOWN_SIGNALS: [i32; 4] = [SIGINT, SIGTERM, SIGQUIT, SIGHUP];

/// Longest request or header line accepted
const MAX_LINE: u64 = 8 * 1024;
/// Most header lines read before giving up
const MAX_HEADERS: usize = 100;

/// Errors from setting up or running the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Socket or file system failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Pool construction or shutdown failed
    #[error("thread pool error: {0}")]
    Pool(#[from] ThreadError),

    /// The JSON pool configuration could not be parsed
    #[error("invalid pool configuration {path:?}: {source}")]
    Config {
        /// File that was read
        path: PathBuf,
        /// Parse failure
        #[source]
        source: serde_json::Error,
    },
}

/// Stops a running [`Server`] from another thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    stop: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// Asks the accept loop to stop and wakes it with a throwaway connection.
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);

        let mut addr = self.addr;
        if addr.ip().is_unspecified() {
            addr.set_ip(match addr.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            });
        }
        if let Err(e) = TcpStream::connect(addr) {
            log::debug!("wake-up connection to {} failed: {}", addr, e);
        }
    }

    /// Calls [`shutdown`](ShutdownHandle::shutdown) on the first of
    /// [`SHUTDOWN_SIGNALS`].
    ///
    /// Handlers are installed before this returns. The listener thread exits
    /// after handling one signal.
    #[cfg(unix)]
    pub fn shutdown_on_signals(self) -> io::Result<thread::JoinHandle<()>> {
        let mut signals = Signals::new(SHUTDOWN_SIGNALS)?;
        thread::Builder::new()
            .name("signal-listener".to_string())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    log::info!("received signal {}, shutting down", signal);
                    self.shutdown();
                }
            })
    }
}

/// Listening socket plus the pool that serves it
pub struct Server {
    listener: TcpListener,
    pool: ThreadPool,
    root: Arc<PathBuf>,
    stop: Arc<AtomicBool>,
}

impl Server {
    /// Binds the listening socket and starts the pool.
    pub fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let pool = ThreadPool::with_config(config.pool_config()?)?;
        let listener = TcpListener::bind(config.address())?;
        log::info!("listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            pool,
            root: Arc::new(config.root.clone()),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The pool serving connections
    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    /// A handle that stops [`run`](Server::run) from another thread
    pub fn shutdown_handle(&self) -> io::Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            stop: Arc::clone(&self.stop),
            addr: self.local_addr()?,
        })
    }

    /// Accepts connections until stopped, then shuts the pool down.
    pub fn run(self) -> Result<(), ServerError> {
        for stream in self.listener.incoming() {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => self.dispatch(stream),
                Err(e) => log::warn!("failed to accept connection: {}", e),
            }
        }

        log::info!("accept loop stopped, shutting down pool");
        self.pool.shutdown()?;
        Ok(())
    }

    fn dispatch(&self, stream: TcpStream) {
        // Second descriptor for the 503 reply if the job is refused
        let spare = stream.try_clone();
        let root = Arc::clone(&self.root);
        let job = ClosureJob::with_name(move || handle_connection(stream, &root), "connection");

        match self.pool.submit(job) {
            Ok(()) => {}
            Err(ThreadError::QueueFull { current, max }) => {
                log::warn!("queue full ({}/{}), rejecting connection", current, max);
                match spare {
                    Ok(mut spare) => {
                        if let Err(e) =
                            Response::error(Status::ServiceUnavailable).write_to(&mut spare, false)
                        {
                            log::debug!("failed to send 503: {}", e);
                        }
                    }
                    Err(e) => log::debug!("cannot clone rejected stream: {}", e),
                }
            }
            Err(e) => log::error!("failed to submit connection: {}", e),
        }
    }
}

/// Serves a single request on `stream` and closes it.
///
/// This is the body of every connection job. All failures are handled
/// and logged here; nothing propagates to the pool.
pub fn handle_connection<S: Read + Write>(mut stream: S, root: &Path) {
    let request = match read_request(&mut stream) {
        Ok(Some(request)) => request,
        Ok(None) => return,
        Err(e) => {
            log::debug!("failed to read request: {}", e);
            return;
        }
    };

    let (response, head_only) = match &request {
        Ok(line) => (serve(line, root), line.method == Method::Head),
        Err(RequestError::UnsupportedVersion(_)) => {
            (Response::error(Status::VersionNotSupported), false)
        }
        Err(_) => (Response::error(Status::BadRequest), false),
    };

    match &request {
        Ok(line) => log::info!("{:?} {} -> {}", line.method, line.target, response.status()),
        Err(e) => log::info!("{} -> {}", e, response.status()),
    }

    // A peer that went away shows up here as EPIPE or ECONNRESET
    if let Err(e) = response.write_to(&mut stream, head_only) {
        log::debug!("failed to write response: {}", e);
    }
}

/// Reads the request line and skips the headers.
///
/// Returns `Ok(None)` if the peer closed before sending anything.
fn read_request<S: Read>(stream: &mut S) -> io::Result<Option<Result<RequestLine, RequestError>>> {
    let mut reader = BufReader::new(stream);

    let mut line = String::new();
    if (&mut reader).take(MAX_LINE).read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let request = RequestLine::parse(&line);

    for _ in 0..MAX_HEADERS {
        let mut header = String::new();
        let n = (&mut reader).take(MAX_LINE).read_line(&mut header)?;
        if n == 0 || header.trim_end().is_empty() {
            break;
        }
    }

    Ok(Some(request))
}

fn serve(line: &RequestLine, root: &Path) -> Response {
    if !matches!(line.method, Method::Get | Method::Head) {
        return Response::error(Status::MethodNotAllowed).with_header("Allow", "GET, HEAD");
    }

    let path = match resolve_path(root, &line.target) {
        Ok(path) => path,
        Err(_) => return Response::error(Status::Forbidden),
    };

    match std::fs::read(&path) {
        Ok(body) => Response::new(Status::Ok)
            .with_header("Content-Type", content_type_for(&path))
            .with_body(body),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Response::error(Status::NotFound),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            Response::error(Status::Forbidden)
        }
        Err(e) => {
            log::warn!("failed to read {}: {}", path.display(), e);
            // Directories without a trailing slash land here too
            if path.is_dir() {
                Response::error(Status::NotFound)
            } else {
                Response::error(Status::InternalServerError)
            }
        }
    }
}
