//! Stub JSON-RPC node for integration testing.
//!
//! Answers every HTTP request with an `eth_blockNumber` style response carrying
//! the stub's current height, and counts the requests it served.
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Path of the compiled `sync-monitor` binary.
pub fn sync_monitor_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sync-monitor"))
}

/// A local HTTP server pretending to be a node at a fixed height.
pub struct RpcNodeStub {
    addr: SocketAddr,
    height: Arc<AtomicU64>,
    requests: Arc<AtomicUsize>,
}

impl RpcNodeStub {
    /// Start serving on an ephemeral localhost port.
    pub async fn start(height: u64) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub node");
        let addr = listener.local_addr().expect("stub node address");
        let height = Arc::new(AtomicU64::new(height));
        let requests = Arc::new(AtomicUsize::new(0));

        let served_height = height.clone();
        let served_requests = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let height = served_height.clone();
                let requests = served_requests.clone();
                tokio::spawn(async move {
                    if read_request(&mut socket).await.is_some() {
                        requests.fetch_add(1, Ordering::SeqCst);
                        let _ = respond(socket, height.load(Ordering::SeqCst)).await;
                    }
                });
            }
        });

        Self {
            addr,
            height,
            requests,
        }
    }

    /// Endpoint string as accepted on the command line (`host:port`).
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    pub fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::SeqCst);
    }

    /// Number of RPC requests served so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).into_owned();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return Some(text);
            }
        }
    }
}

async fn respond(mut socket: TcpStream, height: u64) -> std::io::Result<()> {
    let body = format!(r#"{{"jsonrpc":"2.0","id":1,"result":"0x{:x}"}}"#, height);
    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}
