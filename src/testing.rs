//! Loopback fixtures standing in for the remote site.

use flate2::{Compression, write::GzEncoder};
use std::io::Write;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::RelayConfig;

/// Builds a raw HTTP/1.1 response with the given header lines and body.
pub fn raw_response(headers: &[&str], body: &[u8]) -> Vec<u8> {
    let mut out = b"HTTP/1.1 200 OK\r\n".to_vec();
    for header in headers {
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"Connection: close\r\n\r\n");
    out.extend_from_slice(body);
    out
}

pub fn gzip(body: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body).unwrap();
    encoder.finish().unwrap()
}

pub fn front_page(anchors: &[(&str, &str)]) -> String {
    let mut html = String::from("<!DOCTYPE html><html><body><ul>\n");
    for (slug, title) in anchors {
        html.push_str(&format!(
            "<li><a href=\"https://time.com/{slug}\">\n  {title}\n</a></li>\n"
        ));
    }
    html.push_str("</ul></body></html>\n");
    html
}

/// Serves `response` to exactly one connection and resolves to the request
/// head that was received.
pub async fn spawn_upstream(response: Vec<u8>) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut stream = BufReader::new(stream);
        let mut head = String::new();
        loop {
            let mut line = String::new();
            if stream.read_line(&mut line).await.unwrap() == 0 || line == "\r\n" {
                break;
            }
            head.push_str(&line);
        }
        // The client may hang up early (size limits), so write errors are ignored.
        let _ = stream.get_mut().write_all(&response).await;
        let _ = stream.get_mut().shutdown().await;
        head
    });
    (addr, handle)
}

pub fn config_for(addr: SocketAddr) -> RelayConfig {
    let mut cfg = RelayConfig::default();
    cfg.upstream.url = format!("http://{addr}/");
    cfg
}
