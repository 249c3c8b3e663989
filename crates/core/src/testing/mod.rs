//! Testing utilities and mock implementations.
//!
//! This module provides mocks for the feed client and the history store,
//! so search passes and ledger writes can be exercised without network or
//! database access.
//!
//! # Example
//!
//! ```rust,ignore
//! use tvfeed_core::testing::{fixtures, MockFeedClient, MockHistoryStore};
//!
//! let client = MockFeedClient::new();
//! client.set_feed(&url, fixtures::feed(&[fixtures::FeedItem::new("Show.S01E01", "TV")])).await;
//!
//! let store = MockHistoryStore::new();
//! store.fail_next("disk full");
//! ```

mod mock_feed_client;
mod mock_history_store;

pub use mock_feed_client::{MockFeedClient, RecordedFetch};
pub use mock_history_store::MockHistoryStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use quick_xml::escape::escape;

    use crate::history::EpisodeSnapshot;
    use crate::quality::CompositeStatus;

    /// Wrap items in a minimal RSS 2.0 document.
    pub fn feed(items: &[FeedItem]) -> String {
        let body: String = items.iter().map(FeedItem::to_xml).collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <rss version=\"2.0\"><channel><title>Test feed</title>{}</channel></rss>",
            body
        )
    }

    /// Builder for one feed `<item>`.
    ///
    /// Defaults to a magnet link derived from the title and a direct link on
    /// a host that is not the torrent cache. Counts and size are absent.
    #[derive(Debug, Clone)]
    pub struct FeedItem {
        title: Option<String>,
        category: Option<String>,
        magnet: Option<String>,
        enclosure: Option<String>,
        seeders: Option<String>,
        leechers: Option<String>,
        size: Option<String>,
        pubdate: Option<String>,
    }

    impl FeedItem {
        pub fn new(title: &str, category: &str) -> Self {
            let slug = slug(title);
            Self {
                title: Some(title.to_string()),
                category: Some(category.to_string()),
                magnet: Some(format!("magnet:?xt=urn:btih:{}", slug)),
                enclosure: Some(format!("https://bitsnoop.com/dl/{}.torrent", slug)),
                seeders: None,
                leechers: None,
                size: None,
                pubdate: None,
            }
        }

        pub fn seeders(mut self, value: &str) -> Self {
            self.seeders = Some(value.to_string());
            self
        }

        pub fn leechers(mut self, value: &str) -> Self {
            self.leechers = Some(value.to_string());
            self
        }

        pub fn size(mut self, value: &str) -> Self {
            self.size = Some(value.to_string());
            self
        }

        pub fn pubdate(mut self, value: &str) -> Self {
            self.pubdate = Some(value.to_string());
            self
        }

        pub fn magnet(mut self, value: &str) -> Self {
            self.magnet = Some(value.to_string());
            self
        }

        pub fn enclosure(mut self, url: &str) -> Self {
            self.enclosure = Some(url.to_string());
            self
        }

        pub fn without_title(mut self) -> Self {
            self.title = None;
            self
        }

        pub fn without_category(mut self) -> Self {
            self.category = None;
            self
        }

        pub fn without_magnet(mut self) -> Self {
            self.magnet = None;
            self
        }

        pub fn without_enclosure(mut self) -> Self {
            self.enclosure = None;
            self
        }

        pub fn to_xml(&self) -> String {
            let mut xml = String::from("<item>");
            if let Some(title) = &self.title {
                xml.push_str(&element("title", title));
            }
            if let Some(category) = &self.category {
                xml.push_str(&element("category", category));
            }
            if let Some(magnet) = &self.magnet {
                xml.push_str(&format!("<magnetURI><![CDATA[{}]]></magnetURI>", magnet));
            }
            if let Some(url) = &self.enclosure {
                xml.push_str(&format!(
                    "<enclosure url=\"{}\" type=\"application/x-bittorrent\" />",
                    escape(url.as_str())
                ));
            }
            if let Some(seeders) = &self.seeders {
                xml.push_str(&element("numSeeders", seeders));
            }
            if let Some(leechers) = &self.leechers {
                xml.push_str(&element("numLeechers", leechers));
            }
            if let Some(size) = &self.size {
                xml.push_str(&element("size", size));
            }
            if let Some(pubdate) = &self.pubdate {
                xml.push_str(&element("pubDate", pubdate));
            }
            xml.push_str("</item>");
            xml
        }
    }

    fn element(name: &str, text: &str) -> String {
        format!("<{0}>{1}</{0}>", name, escape(text))
    }

    fn slug(title: &str) -> String {
        let slug: String = title
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if slug.is_empty() {
            "item".to_string()
        } else {
            slug
        }
    }

    /// Snapshot of an episode of the default test show.
    pub fn episode(season: u32, episode: u32, status: CompositeStatus) -> EpisodeSnapshot {
        EpisodeSnapshot {
            show_id: 73739,
            season,
            episode,
            status,
        }
    }
}
