use std::time::Duration;

use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{header::CONTENT_TYPE, Client};
use tracing::{debug, info, warn};
use url::Url;

use crate::parser::parse_feed;
use crate::traits::FeedFetcher;
use crate::types::{AggregatorError, FetchConfig, RawFeed, Result};

/// HTTP feed fetcher.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

struct FetchedBody {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn fetch_body(&self, url: &str) -> Result<FetchedBody> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.try_fetch(url).await {
                Ok(body) => {
                    info!("Fetched feed: {} ({} bytes)", url, body.bytes.len());
                    return Ok(body);
                }
                Err(e) => {
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!("Attempt {} failed for {}: {}; retrying in {:?}", attempt + 1, url, e, delay);
                            last_error = Some(e);
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    last_error = Some(e);
                    break;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AggregatorError::General(format!("no attempt made for {}", url))))
    }

    async fn try_fetch(&self, url: &str) -> Result<FetchedBody> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::General(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?.to_vec();

        Ok(FetchedBody { bytes, content_type })
    }
}

impl FeedFetcher for Fetcher {
    async fn fetch(&self, url: &str) -> Result<RawFeed> {
        debug!("Fetching feed: {}", url);
        let url = Url::parse(url)?;
        let body = self.fetch_body(url.as_str()).await?;
        parse_feed(&body.bytes, body.content_type.as_deref())
    }
}
