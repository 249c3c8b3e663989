//! Builds request URLs for a search mode.

use crate::config::ProviderConfig;

use super::SearchMode;

/// URL templates for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlanner {
    rss_url: String,
    search_url: String,
    sort: String,
    direction: String,
    page: u32,
}

impl QueryPlanner {
    pub fn new(config: &ProviderConfig) -> Self {
        let base = config.url.trim_end_matches('/');
        Self {
            rss_url: join(base, &config.rss_path),
            search_url: join(base, &config.search_path),
            sort: config.sort.clone(),
            direction: config.direction.clone(),
            page: config.page,
        }
    }

    /// Request target for a mode. Pure, no I/O.
    ///
    /// `Term` URLs look like `{search_url}{term}/{sort}/{direction}/{page}/?fmt=rss`.
    pub fn plan(&self, mode: &SearchMode) -> String {
        match mode {
            SearchMode::Broad => self.rss_url.clone(),
            SearchMode::Term(term) => {
                let mut url = self.search_url.clone();
                if !url.ends_with('/') {
                    url.push('/');
                }
                url.push_str(&urlencoding::encode(term.trim()));
                url.push_str(&format!(
                    "/{}/{}/{}/?fmt=rss",
                    self.sort, self.direction, self.page
                ));
                url
            }
        }
    }
}

fn join(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}/{}", base, path.trim_start_matches('/'))
}
