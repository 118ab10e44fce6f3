// src/fetch/test_server.rs
//
// Canned-response HTTP listener for exercising the session against real sockets.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

/// What to do with the next accepted connection.
pub enum Reply {
    /// Read the request, then close without answering.
    Hangup,
    Respond(u16, String),
}

/// Request lines (`"GET /network_setup.jst"`) in arrival order.
pub type Requests = Arc<Mutex<Vec<String>>>;

/// Serve `replies` on a fresh port, one connection each, then stop listening.
pub async fn serve(replies: Vec<Reply>) -> (Url, Requests) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();
    let requests: Requests = Arc::default();

    let seen = Arc::clone(&requests);
    tokio::spawn(async move {
        for reply in replies {
            let (mut sock, _) = listener.accept().await.unwrap();
            let line = read_request(&mut sock).await;
            seen.lock().unwrap().push(line);
            match reply {
                Reply::Hangup => drop(sock),
                Reply::Respond(status, body) => {
                    let resp = format!(
                        "HTTP/1.1 {} Canned\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    sock.write_all(resp.as_bytes()).await.unwrap();
                    let _ = sock.shutdown().await;
                }
            }
        }
    });

    (base, requests)
}

/// Read headers and any body; returns the method and path.
async fn read_request(sock: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = sock.read(&mut chunk).await.unwrap();
        if n == 0 {
            break buf.len();
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = sock.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    head.lines()
        .next()
        .and_then(|l| l.rsplit_once(' '))
        .map(|(method_path, _)| method_path.to_string())
        .unwrap_or_default()
}
