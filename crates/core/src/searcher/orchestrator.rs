//! Runs a search pass: plan, fetch, parse and filter per query.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::FeedCache;
use crate::metrics;

use super::registry::{FeedProvider, ProviderRegistry};
use super::{CandidateRelease, FeedClient, FetchOutcome, QueryReport, SearchMode, SearchPassResult};

/// Drives search passes against feed providers.
///
/// Queries of one pass may run concurrently, but each query returns its own
/// candidates and they are merged in query-issue order afterwards.
pub struct SearchOrchestrator {
    client: Arc<dyn FeedClient>,
    cache: Option<Arc<dyn FeedCache>>,
    max_concurrent_queries: usize,
}

impl SearchOrchestrator {
    pub fn new(client: Arc<dyn FeedClient>) -> Self {
        Self {
            client,
            cache: None,
            max_concurrent_queries: 1,
        }
    }

    /// Store broad-feed results in this cache.
    pub fn with_cache(mut self, cache: Arc<dyn FeedCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_max_concurrent_queries(mut self, max: usize) -> Self {
        self.max_concurrent_queries = max.max(1);
        self
    }

    /// Run one pass against a provider, one query per mode in `modes`.
    pub async fn search(&self, provider: &FeedProvider, modes: &[SearchMode]) -> SearchPassResult {
        let start = Instant::now();
        debug!(provider = provider.name(), queries = modes.len(), "Starting search pass");

        let results: Vec<(QueryReport, Vec<CandidateRelease>)> = stream::iter(modes)
            .map(|mode| self.run_query(provider, mode))
            .buffered(self.max_concurrent_queries)
            .collect()
            .await;

        let mut candidates = Vec::new();
        let mut queries = Vec::with_capacity(results.len());
        for (report, mut kept) in results {
            candidates.append(&mut kept);
            queries.push(report);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            provider = provider.name(),
            candidates = candidates.len(),
            duration_ms = duration_ms,
            "Search pass complete"
        );

        SearchPassResult {
            provider: provider.name().to_string(),
            candidates,
            queries,
            duration_ms,
        }
    }

    /// Run the same modes against every enabled provider, one result each,
    /// in registry order.
    pub async fn search_all(
        &self,
        registry: &ProviderRegistry,
        modes: &[SearchMode],
    ) -> Vec<SearchPassResult> {
        let mut results = Vec::with_capacity(registry.len());
        for provider in registry.enabled() {
            results.push(self.search(provider, modes).await);
        }
        results
    }

    async fn run_query(
        &self,
        provider: &FeedProvider,
        mode: &SearchMode,
    ) -> (QueryReport, Vec<CandidateRelease>) {
        let url = provider.plan(mode);
        debug!(provider = provider.name(), mode = %mode, url = %url, "Search mode");

        let outcome = self.client.fetch(&url).await;
        metrics::FEED_FETCHES
            .with_label_values(&[provider.name(), outcome.label()])
            .inc();

        let mut report = QueryReport {
            mode: mode.clone(),
            url,
            outcome: outcome.label().to_string(),
            parsed: 0,
            failed: 0,
            kept: 0,
        };

        let raw = match outcome {
            FetchOutcome::Feed(raw) => raw,
            FetchOutcome::Failed(failure) => {
                debug!(
                    provider = provider.name(),
                    mode = %mode,
                    reason = failure.as_str(),
                    "Skipping query"
                );
                return (report, Vec::new());
            }
        };

        let parsed = provider.parse(&raw, mode);
        report.parsed = parsed.candidates.len();
        report.failed = parsed.failures.len();
        record_items(provider.name(), parsed.candidates.len(), parsed.skipped, parsed.failures.len());

        let kept = provider.filter().apply(parsed.candidates, mode);
        report.kept = kept.len();
        metrics::CANDIDATES_REJECTED
            .with_label_values(&[provider.name()])
            .inc_by((report.parsed - report.kept) as u64);

        if mode.is_broad() {
            self.cache_results(provider, &kept);
        }

        (report, kept)
    }

    fn cache_results(&self, provider: &FeedProvider, kept: &[CandidateRelease]) {
        let Some(cache) = &self.cache else {
            return;
        };
        match cache.store(&provider.id(), kept) {
            Ok(added) => debug!(provider = provider.name(), added = added, "Feed cache updated"),
            Err(e) => warn!(provider = provider.name(), error = %e, "Failed to update feed cache"),
        }
    }
}

fn record_items(provider: &str, parsed: usize, skipped: usize, failed: usize) {
    for (result, count) in [("parsed", parsed), ("skipped", skipped), ("failed", failed)] {
        metrics::FEED_ITEMS
            .with_label_values(&[provider, result])
            .inc_by(count as u64);
    }
}
