//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use request_logger::config::AppConfig;
use request_logger::http::{HandlerFailure, HttpServer, LogEntry};
use request_logger::lifecycle::Shutdown;
use request_logger::observability::LogSink;
use tokio::net::TcpListener;

/// Sink that keeps every record in memory.
#[derive(Default)]
pub struct MemorySink {
    pub entries: Mutex<Vec<LogEntry>>,
    pub failures: Mutex<Vec<HandlerFailure>>,
}

impl LogSink for MemorySink {
    fn record(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }

    fn handler_failed(&self, failure: &HandlerFailure) {
        self.failures.lock().unwrap().push(failure.clone());
    }
}

impl MemorySink {
    /// Entries are emitted when the response body finishes streaming, which
    /// can land just after the client has read it.
    pub async fn wait_for_entries(&self, count: usize) -> Vec<LogEntry> {
        for _ in 0..200 {
            {
                let entries = self.entries.lock().unwrap();
                if entries.len() >= count {
                    return entries.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.entries.lock().unwrap().clone()
    }
}

/// A running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub sink: Arc<MemorySink>,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_server() -> TestServer {
    start_server_with(AppConfig::default()).await
}

pub async fn start_server_with(config: AppConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let sink = Arc::new(MemorySink::default());
    let shutdown = Shutdown::new();
    let server = HttpServer::with_sink(config, sink.clone());
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        sink,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
