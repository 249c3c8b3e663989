//! Feed providers and the registry built from configuration at startup.

use crate::config::{Config, ProviderConfig, SearchConfig};

use super::filter::ResultFilter;
use super::parser::{parse_feed, LinkPolicy, ParsedFeed};
use super::planner::QueryPlanner;
use super::SearchMode;

/// One configured feed source: how to address it, how to read its links and
/// which releases to keep.
#[derive(Debug, Clone)]
pub struct FeedProvider {
    name: String,
    enabled: bool,
    planner: QueryPlanner,
    link_policy: LinkPolicy,
    filter: ResultFilter,
}

impl FeedProvider {
    pub fn new(config: &ProviderConfig, search: &SearchConfig) -> Self {
        Self {
            name: config.name.clone(),
            enabled: config.enabled,
            planner: QueryPlanner::new(config),
            link_policy: LinkPolicy::new(config, search.torrent_method),
            filter: ResultFilter::new(config.min_seeders.or(search.min_seeders)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn filter(&self) -> &ResultFilter {
        &self.filter
    }

    pub fn link_policy(&self) -> &LinkPolicy {
        &self.link_policy
    }

    /// Stable identifier used as the feed cache key.
    pub fn id(&self) -> String {
        self.name.to_lowercase().replace(char::is_whitespace, "_")
    }

    pub fn plan(&self, mode: &SearchMode) -> String {
        self.planner.plan(mode)
    }

    pub fn parse(&self, raw: &str, mode: &SearchMode) -> ParsedFeed {
        parse_feed(raw, mode, &self.link_policy)
    }
}

/// Every provider known to this process, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<FeedProvider>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<FeedProvider>) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config
                .providers
                .iter()
                .map(|p| FeedProvider::new(p, &config.search))
                .collect(),
        )
    }

    /// Look a provider up by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&FeedProvider> {
        self.providers
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn enabled(&self) -> impl Iterator<Item = &FeedProvider> {
        self.providers.iter().filter(|p| p.enabled)
    }

    pub fn all(&self) -> &[FeedProvider] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
