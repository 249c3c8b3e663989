//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Feed fetches (outcome, duration)
//! - Feed parsing and filtering
//! - History ledger appends

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Search
// =============================================================================

/// Feed fetches by provider and outcome.
pub static FEED_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tvfeed_feed_fetches_total", "Total feed fetches"),
        &["provider", "outcome"], // outcome: "feed", "no_data", "unexpected_format"
    )
    .unwrap()
});

/// Feed fetch duration in seconds.
pub static FEED_FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tvfeed_feed_fetch_duration_seconds",
            "Duration of feed requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Feed items by provider and parse result.
pub static FEED_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tvfeed_feed_items_total", "Total feed items processed"),
        &["provider", "result"], // result: "parsed", "skipped", "failed"
    )
    .unwrap()
});

/// Parsed candidates dropped by the result filter.
pub static CANDIDATES_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tvfeed_candidates_rejected_total",
            "Candidates dropped by the seeder/field filter",
        ),
        &["provider"],
    )
    .unwrap()
});

// =============================================================================
// History
// =============================================================================

/// History events appended by action.
pub static HISTORY_APPENDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tvfeed_history_appends_total", "Total history events appended"),
        &["action", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(FEED_FETCHES.clone()),
        Box::new(FEED_FETCH_DURATION.clone()),
        Box::new(FEED_ITEMS.clone()),
        Box::new(CANDIDATES_REJECTED.clone()),
        Box::new(HISTORY_APPENDS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        FEED_FETCHES.with_label_values(&["test", "feed"]).inc();
        assert!(!registry.gather().is_empty());
    }
}
