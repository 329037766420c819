use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;

use super::models::{FeedSource, RawItem};
use super::parser::parse_feed;
use super::FeedReader;
use crate::config::AppConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;
const MAX_RETRIES: u32 = 2;
const INITIAL_RETRY_DELAY_MS: u64 = 500;
const CLIENT_USER_AGENT: &str = concat!("marketbrief/", env!("CARGO_PKG_VERSION"), " (+feed ingestion)");

/// Feed fetcher with a shared HTTP client
pub struct FeedFetcher {
    client: Client,
    max_items: usize,
    timeout_secs: u64,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let timeout_secs = config.sync.request_timeout_secs.max(1);
        let client = Self::build_client(timeout_secs, &config.sync.proxy_url)?;

        Ok(Self {
            client,
            max_items: config.sync.max_items_per_feed.max(1),
            timeout_secs,
        })
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for feed fetching");
        }

        builder.build().map_err(Error::Http)
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/xml;q=0.8,*/*;q=0.5",
            ),
        );
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers
    }

    /// Fetch with retry and exponential backoff on 429/503 and transport errors
    async fn fetch_with_retry(&self, url: &str) -> Result<(StatusCode, Bytes)> {
        let mut last_error = None;
        let mut delay_ms = INITIAL_RETRY_DELAY_MS;

        for attempt in 0..MAX_RETRIES {
            tracing::debug!(url, attempt = attempt + 1, "Fetching feed");

            match self.client.get(url).headers(Self::build_headers()).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
                        tracing::warn!("Received {} for {}, retrying after {}ms...", status, url, delay_ms);
                        last_error = Some(Error::Fetch(format!("HTTP {} for URL: {}", status, url)));
                    } else {
                        match response.bytes().await {
                            Ok(bytes) => return Ok((status, bytes)),
                            Err(e) if e.is_timeout() => return Err(Error::Timeout(self.timeout_secs)),
                            Err(e) => {
                                tracing::warn!("Failed to read response body from {}: {}", url, e);
                                last_error = Some(Error::Http(e));
                            }
                        }
                    }
                }
                Err(e) if e.is_timeout() => {
                    // A timed-out source is not retried within the same run
                    tracing::warn!("Timed out fetching {}", url);
                    return Err(Error::Timeout(self.timeout_secs));
                }
                Err(e) => {
                    tracing::warn!("Request failed for {} (attempt {}): {}", url, attempt + 1, e);
                    last_error = Some(Error::Http(e));
                }
            }

            if attempt < MAX_RETRIES - 1 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::Fetch(format!("Failed to fetch URL after {} attempts: {}", MAX_RETRIES, url))
        }))
    }

    /// Fetch and parse a feed, truncated to the per-feed item cap
    pub async fn fetch_items(&self, source: &FeedSource) -> Result<Vec<RawItem>> {
        tracing::info!(feed = %source.name, "Fetching feed from: {}", source.url);

        let (status, content) = self.fetch_with_retry(&source.url).await?;

        ensure_content_size(content.len(), &source.url)?;

        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP {} for URL: {}", status, source.url)));
        }

        if is_challenge_page(&content) {
            return Err(Error::Fetch(format!(
                "Bot protection challenge returned instead of a feed for URL: {}",
                source.url
            )));
        }

        let mut items = parse_feed(&content)?;
        items.truncate(self.max_items);
        Ok(items)
    }
}

#[async_trait::async_trait]
impl FeedReader for FeedFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawItem>> {
        self.fetch_items(source).await
    }
}

/// Check if content is a Cloudflare-style challenge page
fn is_challenge_page(content: &[u8]) -> bool {
    let check_len = content.len().min(2048);
    let preview = String::from_utf8_lossy(&content[..check_len]);

    preview.contains("Just a moment...")
        || preview.contains("cf-browser-verification")
        || preview.contains("_cf_chl_opt")
        || preview.contains("challenge-platform")
}

fn ensure_content_size(size: usize, url: &str) -> Result<()> {
    if size > MAX_FEED_BYTES {
        return Err(Error::Fetch(format!("Feed too large ({} bytes) for URL: {}", size, url)));
    }
    Ok(())
}
