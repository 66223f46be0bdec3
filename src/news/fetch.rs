use crate::config::UpstreamConfig;
use flate2::read::MultiGzDecoder;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT_ENCODING, CONNECTION, CONTENT_ENCODING, CONTENT_TYPE, HeaderMap, HeaderName};
use reqwest::{Client, redirect};
use std::io::{self, Read};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed to read body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("body exceeds limit of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to decompress body: {0}")]
    Decompress(#[from] io::Error),
}

/// What the response headers say about the body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct BodyKind {
    gzip: bool,
    html: bool,
}

impl BodyKind {
    fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            gzip: header_starts_with(headers, &CONTENT_ENCODING, "gzip"),
            html: header_starts_with(headers, &CONTENT_TYPE, "text/html"),
        }
    }
}

fn header_starts_with(headers: &HeaderMap, name: &HeaderName, prefix: &str) -> bool {
    headers.get_all(name).iter().any(|value| {
        value
            .to_str()
            .map(|v| v.trim_start().to_ascii_lowercase().starts_with(prefix))
            .unwrap_or(false)
    })
}

fn client(upstream: &UpstreamConfig) -> Result<Client, FetchError> {
    // Decompression and redirects are left to us; neither is followed here.
    let mut builder = Client::builder()
        .no_gzip()
        .no_deflate()
        .redirect(redirect::Policy::none());
    if let Some(agent) = upstream.user_agent.as_deref() {
        builder = builder.user_agent(agent);
    }
    builder.build().map_err(FetchError::Request)
}

/// Fetches the upstream page and returns its decoded text, or `None` when the
/// response is not declared as HTML.
pub async fn fetch_page(upstream: &UpstreamConfig) -> Result<Option<String>, FetchError> {
    let resp = client(upstream)?
        .get(&upstream.url)
        .header(ACCEPT_ENCODING, "gzip, deflate")
        .header(CONNECTION, "close")
        .send()
        .await
        .map_err(FetchError::Request)?;

    debug!(status = %resp.status(), headers = ?resp.headers(), "upstream responded");
    let kind = BodyKind::from_headers(resp.headers());
    if !kind.html {
        return Ok(None);
    }

    // Stream with a max size limit
    let max = upstream.max_body_bytes;
    let mut stream = resp.bytes_stream();
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Body)?;
        if buf.len() + chunk.len() > max {
            return Err(FetchError::TooLarge { limit: max });
        }
        buf.extend_from_slice(&chunk);
    }
    debug!(bytes = buf.len(), gzip = kind.gzip, "upstream body received");

    let body = if kind.gzip { gunzip(&buf, max)? } else { buf };
    Ok(Some(String::from_utf8_lossy(&body).into_owned()))
}

/// Decodes every gzip member in `encoded`; the decoded size is held to `max`.
fn gunzip(encoded: &[u8], max: usize) -> Result<Vec<u8>, FetchError> {
    let mut decoded = Vec::new();
    MultiGzDecoder::new(encoded)
        .take(max as u64 + 1)
        .read_to_end(&mut decoded)?;
    if decoded.len() > max {
        return Err(FetchError::TooLarge { limit: max });
    }
    Ok(decoded)
}
