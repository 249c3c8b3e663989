pub mod cache;
pub mod config;
pub mod history;
pub mod metrics;
pub mod quality;
pub mod searcher;
pub mod testing;

pub use cache::{CacheError, CachedFeedItem, FeedCache, SqliteFeedCache};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ProviderConfig,
    SearchConfig, TorrentMethod,
};
pub use history::{
    Episode, EpisodeSnapshot, HistoryError, HistoryEvent, HistoryLedger, HistoryStore,
    SnatchedRelease, SqliteHistoryStore, SubtitleResult,
};
pub use quality::{decode, encode, Action, CompositeStatus, Quality};
pub use searcher::{
    CandidateRelease, FeedClient, FeedProvider, FetchOutcome, HttpFeedClient, ProviderRegistry,
    SearchMode, SearchOrchestrator, SearchPassResult,
};
