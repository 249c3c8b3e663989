//! SQLite-backed feed cache.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{CacheError, CachedFeedItem, FeedCache};
use crate::searcher::CandidateRelease;

/// SQLite-backed feed cache.
pub struct SqliteFeedCache {
    conn: Mutex<Connection>,
}

impl SqliteFeedCache {
    /// Open (or create) a cache database file.
    pub fn new(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path).map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory cache. Contents are lost when it is dropped.
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rss_cache (
                rss_cache_id INTEGER PRIMARY KEY,
                name TEXT,
                url TEXT,
                time NUMERIC DEFAULT 0,
                provider_id TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_rss_cache_provider_url ON rss_cache(provider_id, url);
            CREATE INDEX IF NOT EXISTS idx_rss_cache_time ON rss_cache(time);
            "#,
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Database("connection mutex poisoned".to_string()))
    }
}

impl FeedCache for SqliteFeedCache {
    fn store(&self, provider_id: &str, candidates: &[CandidateRelease]) -> Result<u32, CacheError> {
        let conn = self.lock()?;
        let now = Utc::now().timestamp();
        let mut new_count = 0;

        for candidate in candidates {
            let updated = conn
                .execute(
                    "UPDATE rss_cache SET name = ?, time = ? WHERE provider_id = ? AND url = ?",
                    params![&candidate.title, now, provider_id, &candidate.link],
                )
                .map_err(|e| CacheError::Database(e.to_string()))?;

            if updated == 0 {
                conn.execute(
                    "INSERT INTO rss_cache (name, url, time, provider_id) VALUES (?, ?, ?, ?)",
                    params![&candidate.title, &candidate.link, now, provider_id],
                )
                .map_err(|e| CacheError::Database(e.to_string()))?;
                new_count += 1;
            }
        }

        Ok(new_count)
    }

    fn recent(&self, provider_id: &str, limit: u32) -> Result<Vec<CachedFeedItem>, CacheError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT provider_id, name, url, time FROM rss_cache
                 WHERE provider_id = ?
                 ORDER BY time DESC, rss_cache_id DESC
                 LIMIT ?",
            )
            .map_err(|e| CacheError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![provider_id, limit], |row| {
                let time: i64 = row.get(3)?;
                Ok(CachedFeedItem {
                    provider_id: row.get(0)?,
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    url: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    time: DateTime::from_timestamp(time, 0).unwrap_or_default(),
                })
            })
            .map_err(|e| CacheError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(|e| CacheError::Database(e.to_string()))?);
        }
        Ok(items)
    }

    fn prune(&self, older_than: DateTime<Utc>) -> Result<u64, CacheError> {
        let conn = self.lock()?;
        let removed = conn
            .execute(
                "DELETE FROM rss_cache WHERE time < ?",
                params![older_than.timestamp()],
            )
            .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(removed as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searcher::UNKNOWN_SIZE;
    use chrono::Duration;

    fn candidate(title: &str) -> CandidateRelease {
        CandidateRelease {
            title: title.to_string(),
            link: format!("magnet:?xt=urn:btih:{}", title.to_lowercase()),
            size: UNKNOWN_SIZE,
            seeders: 5,
            leechers: 1,
            pubdate: None,
        }
    }

    #[test]
    fn test_store_and_recent() {
        let cache = SqliteFeedCache::in_memory().unwrap();
        let added = cache
            .store("bitsnoop", &[candidate("A.S01E01"), candidate("B.S01E02")])
            .unwrap();
        assert_eq!(added, 2);

        let items = cache.recent("bitsnoop", 10).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.provider_id == "bitsnoop"));
        assert!(cache.recent("other", 10).unwrap().is_empty());
    }

    #[test]
    fn test_store_refreshes_existing() {
        let cache = SqliteFeedCache::in_memory().unwrap();
        cache.store("bitsnoop", &[candidate("A.S01E01")]).unwrap();
        let added = cache
            .store("bitsnoop", &[candidate("A.S01E01"), candidate("C.S01E03")])
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(cache.recent("bitsnoop", 10).unwrap().len(), 2);
    }

    #[test]
    fn test_same_link_different_providers() {
        let cache = SqliteFeedCache::in_memory().unwrap();
        cache.store("one", &[candidate("A.S01E01")]).unwrap();
        let added = cache.store("two", &[candidate("A.S01E01")]).unwrap();
        assert_eq!(added, 1);
    }

    #[test]
    fn test_recent_limit() {
        let cache = SqliteFeedCache::in_memory().unwrap();
        let candidates: Vec<_> = (0..5).map(|i| candidate(&format!("T{}", i))).collect();
        cache.store("bitsnoop", &candidates).unwrap();
        assert_eq!(cache.recent("bitsnoop", 3).unwrap().len(), 3);
    }

    #[test]
    fn test_prune() {
        let cache = SqliteFeedCache::in_memory().unwrap();
        cache.store("bitsnoop", &[candidate("A.S01E01")]).unwrap();

        let removed = cache.prune(Utc::now() - Duration::hours(1)).unwrap();
        assert_eq!(removed, 0);

        let removed = cache.prune(Utc::now() + Duration::hours(1)).unwrap();
        assert_eq!(removed, 1);
        assert!(cache.recent("bitsnoop", 10).unwrap().is_empty());
    }

    #[test]
    fn test_file_based_cache() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("cache.db");

        let cache = SqliteFeedCache::new(&db_path).unwrap();
        cache.store("bitsnoop", &[candidate("A.S01E01")]).unwrap();
        assert!(db_path.exists());
    }
}
