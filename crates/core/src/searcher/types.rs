//! Types for the feed search system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size value used when a feed item's size cannot be parsed.
pub const UNKNOWN_SIZE: i64 = -1;

/// What a single query asks the provider for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", content = "term", rename_all = "snake_case")]
pub enum SearchMode {
    /// Unfiltered recent-items feed.
    Broad,
    /// Query scoped to a search phrase.
    Term(String),
}

impl SearchMode {
    pub fn term(term: impl Into<String>) -> Self {
        SearchMode::Term(term.into())
    }

    pub fn is_broad(&self) -> bool {
        matches!(self, SearchMode::Broad)
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Broad => f.write_str("RSS"),
            SearchMode::Term(term) => write!(f, "Term({})", term),
        }
    }
}

/// A normalized feed entry that may be worth snatching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRelease {
    /// Release title, never empty.
    pub title: String,
    /// Magnet URI or direct .torrent link, never empty.
    pub link: String,
    /// Size in bytes, [`UNKNOWN_SIZE`] when the feed gave nothing usable.
    pub size: i64,
    pub seeders: u32,
    pub leechers: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubdate: Option<DateTime<Utc>>,
}

impl CandidateRelease {
    pub fn size_known(&self) -> bool {
        self.size != UNKNOWN_SIZE
    }
}

/// Why a fetch produced no feed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailure {
    /// Transport error, timeout, error status or empty body.
    NoData,
    /// A body came back but it is not a feed document.
    UnexpectedFormat,
}

impl FetchFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchFailure::NoData => "no_data",
            FetchFailure::UnexpectedFormat => "unexpected_format",
        }
    }
}

/// Result of one provider request. Never an error: failures degrade to an
/// empty result with a classification for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Feed(String),
    Failed(FetchFailure),
}

impl FetchOutcome {
    pub fn no_data() -> Self {
        FetchOutcome::Failed(FetchFailure::NoData)
    }

    pub fn unexpected_format() -> Self {
        FetchOutcome::Failed(FetchFailure::UnexpectedFormat)
    }

    /// Label for metrics and reports.
    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Feed(_) => "feed",
            FetchOutcome::Failed(failure) => failure.as_str(),
        }
    }
}

/// HTTP fetch primitive used by the search orchestrator.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Issue one GET. Implementations must not retry and must bound the
    /// request with a timeout.
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// What happened to one planned query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReport {
    pub mode: SearchMode,
    pub url: String,
    /// `feed`, `no_data` or `unexpected_format`.
    pub outcome: String,
    /// Items that became candidates before filtering.
    pub parsed: usize,
    /// Items dropped because of a parse failure.
    pub failed: usize,
    /// Candidates that survived the filter.
    pub kept: usize,
}

/// Candidates and per-query reports from one provider's search pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPassResult {
    pub provider: String,
    /// Kept candidates, in query-issue order then feed order.
    pub candidates: Vec<CandidateRelease>,
    pub queries: Vec<QueryReport>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&SearchMode::Broad).unwrap(),
            r#"{"mode":"broad"}"#
        );
        assert_eq!(
            serde_json::to_string(&SearchMode::term("Show S01E02")).unwrap(),
            r#"{"mode":"term","term":"Show S01E02"}"#
        );
    }

    #[test]
    fn test_search_mode_display() {
        assert_eq!(SearchMode::Broad.to_string(), "RSS");
        assert_eq!(SearchMode::term("abc").to_string(), "Term(abc)");
    }

    #[test]
    fn test_fetch_outcome_label() {
        assert_eq!(FetchOutcome::Feed(String::new()).label(), "feed");
        assert_eq!(FetchOutcome::no_data().label(), "no_data");
        assert_eq!(FetchOutcome::unexpected_format().label(), "unexpected_format");
    }

    #[test]
    fn test_candidate_serialization_skips_missing_pubdate() {
        let candidate = CandidateRelease {
            title: "Show.Name.S01E02.HDTV.x264".to_string(),
            link: "magnet:?xt=urn:btih:abc".to_string(),
            size: UNKNOWN_SIZE,
            seeders: 3,
            leechers: 1,
            pubdate: None,
        };
        let json = serde_json::to_string(&candidate).unwrap();
        assert!(!json.contains("pubdate"));
        assert!(!candidate.size_known());
    }
}
