//! Feed cache - recent items seen in providers' broad feeds.
//!
//! Broad-feed results are stored per provider so later passes (and callers
//! that only want "what's new") can read them without another request.

mod sqlite;

pub use sqlite::SqliteFeedCache;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::searcher::CandidateRelease;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(String),
}

/// A cached feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFeedItem {
    pub provider_id: String,
    /// Release title
    pub name: String,
    /// Download link
    pub url: String,
    /// When the item was last seen
    pub time: DateTime<Utc>,
}

/// Trait for feed cache storage.
pub trait FeedCache: Send + Sync {
    /// Store candidates for a provider. Items already cached (same link) are
    /// refreshed. Returns the number of new items.
    fn store(&self, provider_id: &str, candidates: &[CandidateRelease]) -> Result<u32, CacheError>;

    /// Most recently seen items for a provider, newest first.
    fn recent(&self, provider_id: &str, limit: u32) -> Result<Vec<CachedFeedItem>, CacheError>;

    /// Remove items last seen before `older_than`. Returns the number removed.
    fn prune(&self, older_than: DateTime<Utc>) -> Result<u64, CacheError>;
}
