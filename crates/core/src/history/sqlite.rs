use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use super::{HistoryError, HistoryEvent, HistoryStore};

/// SQLite-backed history store
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Create a new SQLite history store, creating the database file and table if needed
    pub fn new(path: &Path) -> Result<Self, HistoryError> {
        let conn = Connection::open(path).map_err(|e| HistoryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite history store (useful for testing)
    pub fn in_memory() -> Result<Self, HistoryError> {
        let conn =
            Connection::open_in_memory().map_err(|e| HistoryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), HistoryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                action INTEGER NOT NULL,
                date TEXT NOT NULL,
                showid INTEGER NOT NULL,
                season INTEGER NOT NULL,
                episode INTEGER NOT NULL,
                quality INTEGER NOT NULL,
                resource TEXT,
                provider TEXT,
                version INTEGER DEFAULT -1,
                proper_tags TEXT DEFAULT '',
                manually_searched INTEGER DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_history_showid_date ON history(showid, date);
            "#,
        )
        .map_err(|e| HistoryError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, HistoryError> {
        self.conn
            .lock()
            .map_err(|_| HistoryError::Database("connection mutex poisoned".to_string()))
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn insert(&self, event: &HistoryEvent) -> Result<i64, HistoryError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO history \
             (action, date, showid, season, episode, quality, resource, provider, version, proper_tags, manually_searched) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                event.action.value(),
                event.date_column(),
                event.show_id,
                event.season,
                event.episode,
                event.quality.flag(),
                event.resource,
                event.provider_column(),
                event.version_column(),
                event.proper_tags_column(),
                event.manually_searched,
            ],
        )
        .map_err(|e| HistoryError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }
}
