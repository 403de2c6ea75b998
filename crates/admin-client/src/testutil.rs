//! Test-only helpers: a canned-response HTTP stub over a raw TCP listener.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Minimal HTTP/1.1 server answering every request with one fixed response.
/// Records raw request text (request line, headers and body) for assertions.
pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl StubServer {
    pub async fn spawn(status: u16, body: &str) -> Self {
        Self::spawn_inner(status, body, 0).await
    }

    /// Declares more body bytes than it sends, then closes the connection,
    /// so clients reading the body hit a truncated stream.
    pub async fn spawn_truncated(status: u16, body: &str) -> Self {
        Self::spawn_inner(status, body, 64).await
    }

    async fn spawn_inner(status: u16, body: &str, declared_extra: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let body = body.to_owned();

        let task = tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let recorded = Arc::clone(&recorded);
                let body = body.clone();
                tokio::spawn(async move {
                    let request = read_request(&mut socket).await;
                    recorded.lock().await.push(request);
                    let response = format!(
                        "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len() + declared_extra
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn last_request(&self) -> String {
        self.requests.lock().await.last().cloned().unwrap_or_default()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Case-insensitive header lookup in a recorded raw request.
pub fn has_header(request: &str, name: &str, value: &str) -> bool {
    let needle = format!("{name}: {value}").to_ascii_lowercase();
    request
        .lines()
        .any(|line| line.to_ascii_lowercase() == needle)
}

pub fn has_header_named(request: &str, name: &str) -> bool {
    let prefix = format!("{name}:").to_ascii_lowercase();
    request
        .lines()
        .any(|line| line.to_ascii_lowercase().starts_with(&prefix))
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::with_capacity(8192);
    let mut chunk = [0u8; 4096];
    let mut header_end = None;

    // Read headers first, then the declared body length if any.
    loop {
        if header_end.is_none() {
            if let Some(pos) = find_header_end(&buf) {
                header_end = Some(pos);
            }
        }
        if let Some(pos) = header_end {
            let expected = pos + content_length(&buf[..pos]);
            if buf.len() >= expected {
                break;
            }
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

fn content_length(headers: &[u8]) -> usize {
    let text = String::from_utf8_lossy(headers);
    text.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())?
        })
        .unwrap_or(0)
}
