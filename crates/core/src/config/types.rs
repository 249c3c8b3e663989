use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// History ledger database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tvfeed.db")
}

/// Feed cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Database file for the cache. In-memory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// How long cached feed items are kept (default: 7 days)
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            retention_secs: default_retention_secs(),
        }
    }
}

/// Longest accepted cache retention (100 years).
pub const MAX_RETENTION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

impl CacheConfig {
    /// Items last seen before this instant are pruned. `None` when the
    /// retention does not fit in the representable time range.
    pub fn prune_cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.retention_secs).ok()?;
        let retention = Duration::try_seconds(secs)?;
        now.checked_sub_signed(retention)
    }
}

fn default_retention_secs() -> u64 {
    7 * 24 * 60 * 60
}

/// How snatched releases are handed to the download side.
///
/// `Blackhole` drops .torrent files into a watched folder, so direct links
/// from the cache host are preferred over magnets.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TorrentMethod {
    Blackhole,
    #[default]
    Client,
}

/// Search pass configuration shared by every provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Minimum seeders a release needs to be kept. Unset means 0; the
    /// effective floor is always at least 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_seeders: Option<u32>,
    /// Queries in flight at once per provider (default: 4)
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,
    #[serde(default)]
    pub torrent_method: TorrentMethod,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            min_seeders: None,
            max_concurrent_queries: default_max_concurrent_queries(),
            torrent_method: TorrentMethod::default(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u32 {
    30
}

fn default_max_concurrent_queries() -> usize {
    4
}

fn default_user_agent() -> String {
    format!("tvfeed/{}", env!("CARGO_PKG_VERSION"))
}

/// A torrent feed provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub name: String,
    /// Base URL (e.g., "https://bitsnoop.com")
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Path of the recent-items feed
    #[serde(default = "default_rss_path")]
    pub rss_path: String,
    /// Path prefix for term searches; the encoded term follows it
    #[serde(default = "default_search_path")]
    pub search_path: String,
    /// Sort key appended to term searches (default: "s", seeders)
    #[serde(default = "default_sort")]
    pub sort: String,
    /// Sort direction (default: "d", descending)
    #[serde(default = "default_direction")]
    pub direction: String,
    #[serde(default = "default_page")]
    pub page: u32,
    /// Host marker of the .torrent cache whose direct links are usable
    #[serde(default = "default_cache_host")]
    pub cache_host: String,
    /// Tracker parameters appended to magnet links (e.g., "&tr=udp://...")
    #[serde(default)]
    pub custom_trackers: String,
    /// Overrides `search.min_seeders` for this provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_seeders: Option<u32>,
}

impl ProviderConfig {
    /// Provider config with defaults for everything but name and URL.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            enabled: true,
            rss_path: default_rss_path(),
            search_path: default_search_path(),
            sort: default_sort(),
            direction: default_direction(),
            page: default_page(),
            cache_host: default_cache_host(),
            custom_trackers: String::new(),
            min_seeders: None,
        }
    }
}

fn default_rss_path() -> String {
    "/new_video.html?fmt=rss".to_string()
}

fn default_search_path() -> String {
    "/search/video/".to_string()
}

fn default_sort() -> String {
    "s".to_string()
}

fn default_direction() -> String {
    "d".to_string()
}

fn default_page() -> u32 {
    1
}

fn default_cache_host() -> String {
    "torcache".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(retention_secs: u64) -> CacheConfig {
        CacheConfig {
            retention_secs,
            ..Default::default()
        }
    }

    #[test]
    fn test_prune_cutoff() {
        let now = Utc::now();
        assert_eq!(cache(3600).prune_cutoff(now), Some(now - Duration::hours(1)));
        assert_eq!(cache(0).prune_cutoff(now), Some(now));
    }

    #[test]
    fn test_prune_cutoff_out_of_range() {
        let now = Utc::now();
        assert_eq!(cache(10_000_000_000_000_000).prune_cutoff(now), None);
        assert_eq!(cache(u64::MAX).prune_cutoff(now), None);
    }

    #[test]
    fn test_max_retention_has_cutoff() {
        assert!(cache(MAX_RETENTION_SECS).prune_cutoff(Utc::now()).is_some());
    }
}
