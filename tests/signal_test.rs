//! A shutdown signal stops the accept loop and drains the pool
#![cfg(unix)]

use signal_hook::consts::signal::SIGTERM;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;
use thpool_server::server::{Server, ServerConfig};

#[test]
fn test_sigterm_shuts_server_down() {
    let root = std::env::temp_dir().join(format!("thpool-signal-{}", std::process::id()));
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("index.html"), "up").unwrap();

    let config = ServerConfig {
        port: 0,
        root: root.clone(),
        workers: 2,
        queue_capacity: 4,
        ..Default::default()
    };
    let server = Server::bind(&config).unwrap();
    let addr = server.local_addr().unwrap();
    let listener = server.shutdown_handle().unwrap().shutdown_on_signals().unwrap();
    let runner = thread::spawn(move || server.run());

    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream.write_all(b"GET / HTTP/1.0\r\n\r\n").unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).unwrap();
    assert!(reply.starts_with("HTTP/1.0 200 OK\r\n"));

    signal_hook::low_level::raise(SIGTERM).unwrap();

    listener.join().unwrap();
    runner.join().unwrap().unwrap();
    std::fs::remove_dir_all(&root).unwrap();
}
