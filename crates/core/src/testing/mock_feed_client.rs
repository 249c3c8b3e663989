//! Mock feed client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::searcher::{FeedClient, FetchOutcome};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    /// The URL that was requested.
    pub url: String,
    /// When the fetch was made.
    pub timestamp: Instant,
}

/// Mock implementation of the FeedClient trait.
///
/// Provides controllable behavior for testing:
/// - Canned outcomes per URL (unknown URLs answer with no data)
/// - Per-URL delays to shuffle completion order
/// - Recorded fetches for assertions
///
/// # Example
///
/// ```rust,ignore
/// use tvfeed_core::testing::{MockFeedClient, fixtures};
///
/// let client = MockFeedClient::new();
/// client.set_feed(&provider.plan(&SearchMode::Broad), fixtures::feed(&[
///     fixtures::FeedItem::new("Show.S01E01.720p", "TV").seeders("10"),
/// ])).await;
///
/// let result = orchestrator.search(&provider, &[SearchMode::Broad]).await;
/// assert_eq!(client.fetch_count().await, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockFeedClient {
    /// Configured outcomes by URL.
    outcomes: Arc<RwLock<HashMap<String, FetchOutcome>>>,
    /// Simulated latency by URL.
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    /// Recorded fetches.
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
}

impl MockFeedClient {
    /// Create a new mock client with no configured responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with this feed document.
    pub async fn set_feed(&self, url: &str, body: impl Into<String>) {
        self.set_outcome(url, FetchOutcome::Feed(body.into())).await;
    }

    /// Answer `url` with this outcome.
    pub async fn set_outcome(&self, url: &str, outcome: FetchOutcome) {
        self.outcomes.write().await.insert(url.to_string(), outcome);
    }

    /// Delay the answer for `url`.
    pub async fn set_delay(&self, url: &str, delay: Duration) {
        self.delays.write().await.insert(url.to_string(), delay);
    }

    /// Get recorded fetches, in the order they were issued.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    /// Get the number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }

    /// Clear recorded fetches.
    pub async fn clear_recorded(&self) {
        self.fetches.write().await.clear();
    }
}

#[async_trait]
impl FeedClient for MockFeedClient {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.fetches.write().await.push(RecordedFetch {
            url: url.to_string(),
            timestamp: Instant::now(),
        });

        let delay = self.delays.read().await.get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.outcomes
            .read()
            .await
            .get(url)
            .cloned()
            .unwrap_or_else(FetchOutcome::no_data)
    }
}
