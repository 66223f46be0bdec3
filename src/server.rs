use anyhow::{Context, Result};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::news;

const MAX_REQUEST_HEAD: usize = 64 * 1024;

/// Reads request lines up to the blank line that ends the head and drops them.
///
/// Lines are raw bytes; nothing in them has to be valid UTF-8.
pub async fn consume_request<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut consumed = 0;
    let mut line = Vec::new();
    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "client closed before end of request head",
            ));
        }
        consumed += n;
        if consumed > MAX_REQUEST_HEAD {
            warn!(bytes = consumed, limit = MAX_REQUEST_HEAD, "request head too large");
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("request head exceeds {MAX_REQUEST_HEAD} bytes"),
            ));
        }

        let trimmed = line.strip_suffix(b"\n").unwrap_or(&line[..]);
        let trimmed = trimmed.strip_suffix(b"\r").unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Ok(());
        }
        debug!(line = %String::from_utf8_lossy(trimmed), "request");
    }
}

/// Builds the full response text for one request.
pub async fn respond(cfg: &RelayConfig) -> String {
    let stories = news::latest(cfg).await;
    let body = news::to_json(&stories).unwrap_or_else(|err| {
        error!(error = %err, "failed to encode stories");
        "[]".to_string()
    });

    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: application/json\r\n\
         Connection: close\r\n\
         \r\n\
         {body}\r\n"
    )
}

pub async fn handle_connection<S>(stream: S, cfg: &RelayConfig) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stream = BufReader::new(stream);
    consume_request(&mut stream).await?;

    let response = respond(cfg).await;
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// Accepts connections one at a time; each is fully handled before the next
/// `accept`.
pub async fn serve(listener: TcpListener, cfg: &RelayConfig) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await.context("failed to accept connection")?;
        info!(%peer, "accepted connection");
        if let Err(err) = handle_connection(stream, cfg).await {
            warn!(%peer, error = %err, "connection aborted");
        }
    }
}
