//! reqwest-backed feed client.

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::metrics;

use super::{FeedClient, FetchOutcome};

/// Every feed document is expected to start with this.
pub const FEED_PROLOGUE: &str = "<?xml";

/// Feed client issuing one bounded GET per fetch.
pub struct HttpFeedClient {
    client: Client,
}

impl HttpFeedClient {
    /// Create a client with the configured timeout and user agent.
    pub fn new(config: &SearchConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get_text(&self, url: &str) -> Result<String, String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status));
        }

        response.text().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let start = Instant::now();
        let outcome = match self.get_text(url).await {
            Ok(body) => classify_body(url, body),
            Err(error) => {
                debug!(url = url, error = %error, "No data returned from provider");
                FetchOutcome::no_data()
            }
        };

        metrics::FEED_FETCH_DURATION
            .with_label_values(&[outcome.label()])
            .observe(start.elapsed().as_secs_f64());
        outcome
    }
}

/// Turn a response body into an outcome, checking the feed prologue.
pub fn classify_body(url: &str, body: String) -> FetchOutcome {
    let trimmed = body.trim_start_matches('\u{feff}').trim_start();
    if trimmed.is_empty() {
        debug!(url = url, "No data returned from provider");
        return FetchOutcome::no_data();
    }
    if !trimmed.starts_with(FEED_PROLOGUE) {
        info!(
            url = url,
            "Expected xml but got something else, is your mirror failing?"
        );
        return FetchOutcome::unexpected_format();
    }
    FetchOutcome::Feed(body)
}
