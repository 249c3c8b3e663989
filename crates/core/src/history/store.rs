use thiserror::Error;

use super::HistoryEvent;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Durable storage for history events.
///
/// A single insert primitive: no reads, updates or deletes. Implementations
/// must tolerate concurrent independent inserts.
pub trait HistoryStore: Send + Sync {
    /// Insert one event, returns the assigned row id
    fn insert(&self, event: &HistoryEvent) -> Result<i64, HistoryError>;
}
