mod extract;
mod fetch;
mod json;
mod model;

use crate::config::RelayConfig;
use tracing::{debug, info, warn};

use extract::extract_stories;
use fetch::fetch_page;

pub use json::to_json;
pub use model::Story;

/// Fetches the upstream page and extracts its headlines.
///
/// Every failure on the way (unreachable host, non-HTML response, unreadable
/// body) is logged and turned into an empty list.
pub async fn latest(cfg: &RelayConfig) -> Vec<Story> {
    match fetch_page(&cfg.upstream).await {
        Ok(Some(page)) => {
            debug!(chars = page.len(), "extracting stories");
            let stories = extract_stories(&page, &cfg.extract);
            info!(count = stories.len(), url = %cfg.upstream.url, "stories extracted");
            stories
        }
        Ok(None) => {
            warn!(url = %cfg.upstream.url, "upstream did not return html content");
            Vec::new()
        }
        Err(err) => {
            warn!(url = %cfg.upstream.url, error = %err, "failed to fetch upstream page");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config_for, front_page, gzip, raw_response, spawn_upstream};
    use tracing_test::traced_test;

    async fn latest_from(response: Vec<u8>) -> Vec<Story> {
        let (addr, upstream) = spawn_upstream(response).await;
        let stories = latest(&config_for(addr)).await;
        upstream.await.unwrap();
        stories
    }

    #[tokio::test]
    async fn gzip_and_plain_pages_extract_identically() {
        let page = front_page(&[("a", "Alpha story"), ("b", "Beta story"), ("c", "Gamma story")]);

        let plain = latest_from(raw_response(&["Content-Type: text/html"], page.as_bytes())).await;
        let zipped = latest_from(raw_response(
            &["Content-Type: text/html", "Content-Encoding: gzip"],
            &gzip(page.as_bytes()),
        ))
        .await;

        assert_eq!(plain.len(), 3);
        assert_eq!(plain, zipped);
        assert_eq!(plain[2], Story::new("Gamma story", "https://time.com/c"));
    }

    #[tokio::test]
    async fn text_plain_yields_no_stories() {
        let page = front_page(&[("a", "Alpha story")]);
        let stories = latest_from(raw_response(&["Content-Type: text/plain"], page.as_bytes())).await;
        assert!(stories.is_empty());
    }

    #[tokio::test]
    async fn stops_at_the_configured_cap() {
        let anchors: Vec<(String, String)> =
            (0..10).map(|i| (format!("s{i}"), format!("Story number {i}"))).collect();
        let refs: Vec<(&str, &str)> = anchors.iter().map(|(s, t)| (s.as_str(), t.as_str())).collect();
        let page = front_page(&refs);

        let stories = latest_from(raw_response(&["Content-Type: text/html"], page.as_bytes())).await;
        assert_eq!(stories.len(), 6);
        assert_eq!(stories[5].link, "https://time.com/s5");
    }

    #[tokio::test]
    #[traced_test]
    async fn unreachable_upstream_is_logged_and_absorbed() {
        let addr = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
        assert!(latest(&config_for(addr)).await.is_empty());
        assert!(logs_contain("failed to fetch upstream page"));
    }
}
