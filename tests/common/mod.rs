//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use edge_gateway::config::GatewayConfig;
use edge_gateway::lifecycle::{Gateway, Shutdown};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// One request as seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    /// e.g. `GET /v2/chapter?id=1 HTTP/1.1`
    pub line: String,
    /// Lower-cased header names with their values.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Handle on a running mock upstream.
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockUpstream {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    /// `host:port` as it must appear in the allowlist.
    pub fn host(&self) -> String {
        self.addr.to_string()
    }
}

/// Start a mock upstream that always answers 200 with a fixed JSON body.
pub async fn start_mock_upstream(body: &'static str) -> MockUpstream {
    start_programmable_upstream(move |_| async move { (200, body.to_string()) }).await
}

/// Start a programmable mock upstream; `f` receives the request line.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> MockUpstream
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let (task_hits, task_seen) = (hits.clone(), seen.clone());
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let f = f.clone();
            let hits = task_hits.clone();
            let seen = task_seen.clone();
            tokio::spawn(async move {
                let (read, mut write) = socket.into_split();
                let mut reader = BufReader::new(read);

                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                    return;
                }
                let mut headers = Vec::new();
                loop {
                    let mut header = String::new();
                    if reader.read_line(&mut header).await.unwrap_or(0) == 0 {
                        break;
                    }
                    let header = header.trim_end();
                    if header.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = header.split_once(':') {
                        headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
                    }
                }
                let length = headers
                    .iter()
                    .find(|(n, _)| n == "content-length")
                    .and_then(|(_, v)| v.parse::<usize>().ok())
                    .unwrap_or(0);
                let mut body = vec![0; length];
                let _ = reader.read_exact(&mut body).await;

                let line = line.trim_end().to_string();
                hits.fetch_add(1, Ordering::SeqCst);
                seen.lock().unwrap().push(SeenRequest {
                    line: line.clone(),
                    headers,
                    body: String::from_utf8_lossy(&body).into_owned(),
                });

                let (status, body) = f(line).await;
                let status_text = match status {
                    200 => "200 OK".to_string(),
                    404 => "404 Not Found".to_string(),
                    500 => "500 Internal Server Error".to_string(),
                    503 => "503 Service Unavailable".to_string(),
                    other => format!("{} Status", other),
                };
                write_response(&mut write, &status_text, &body).await;
            });
        }
    });

    MockUpstream { addr, hits, seen }
}

async fn write_response(socket: &mut tokio::net::tcp::OwnedWriteHalf, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Defaults on an ephemeral port, with `upstreams` as the only allowed hosts over plain HTTP.
pub fn gateway_config(upstreams: &[&MockUpstream]) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.proxy.upstream_scheme = "http".into();
    config.proxy.allowed_hosts = upstreams.iter().map(|u| u.host()).collect();
    config
}

/// Boot a gateway in the background. Trigger the returned `Shutdown` to stop it.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let gateway = Gateway::bind(config).await.unwrap();
    let addr = gateway.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let serve_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = gateway.serve(serve_shutdown).await;
    });
    (addr, shutdown)
}

/// Client without connection pooling or system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Give detached cache writes time to land.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}
