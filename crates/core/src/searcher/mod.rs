//! Feed search.
//!
//! A search pass plans one request per [`SearchMode`], fetches it through a
//! [`FeedClient`], parses the feed into [`CandidateRelease`]s and filters
//! them. Provider failures only ever shrink the result.

mod client;
mod filter;
mod orchestrator;
mod parser;
mod planner;
mod registry;
mod size;
mod types;

pub use client::{classify_body, HttpFeedClient, FEED_PROLOGUE};
pub use filter::ResultFilter;
pub use orchestrator::SearchOrchestrator;
pub use parser::{parse_feed, ItemParseError, LinkPolicy, ParsedFeed};
pub use planner::QueryPlanner;
pub use registry::{FeedProvider, ProviderRegistry};
pub use size::{convert_size, try_int};
pub use types::*;
