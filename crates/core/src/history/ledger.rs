use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Timelike};
use tracing::{debug, error};

use crate::metrics;
use crate::quality::{CompositeStatus, Quality};

use super::{
    download_event, failed_event, snatch_events, subtitle_event, Episode, HistoryError,
    HistoryEvent, HistoryStore, SnatchedRelease, SubtitleResult,
};

/// Appends history events to a store.
///
/// Each call writes synchronously and returns once the row is stored. Write
/// failures are returned to the caller, never retried.
#[derive(Clone)]
pub struct HistoryLedger {
    store: Arc<dyn HistoryStore>,
}

impl HistoryLedger {
    pub fn new(store: Arc<dyn HistoryStore>) -> Self {
        Self { store }
    }

    /// Append one event. Identical events produce separate rows.
    pub fn append(&self, event: &HistoryEvent) -> Result<i64, HistoryError> {
        let action = event.action.action().name();
        match self.store.insert(event) {
            Ok(id) => {
                metrics::HISTORY_APPENDS
                    .with_label_values(&[action, "success"])
                    .inc();
                debug!(
                    id = id,
                    action = action,
                    show_id = event.show_id,
                    season = event.season,
                    episode = event.episode,
                    resource = %event.resource,
                    "History event appended"
                );
                Ok(id)
            }
            Err(e) => {
                metrics::HISTORY_APPENDS
                    .with_label_values(&[action, "error"])
                    .inc();
                error!(action = action, show_id = event.show_id, error = %e, "Failed to append history event");
                Err(e)
            }
        }
    }

    /// Record a snatch for every episode the release covers.
    ///
    /// Stops at the first failed write; earlier rows stay written.
    pub fn log_snatch<E: Episode>(
        &self,
        release: &SnatchedRelease,
        episodes: &[E],
    ) -> Result<Vec<i64>, HistoryError> {
        snatch_events(release, episodes, now())
            .iter()
            .map(|event| self.append(event))
            .collect()
    }

    pub fn log_download<E: Episode>(
        &self,
        episode: &E,
        filename: &str,
        quality: Quality,
        release_group: Option<&str>,
        version: Option<i64>,
    ) -> Result<i64, HistoryError> {
        self.append(&download_event(
            episode,
            filename,
            quality,
            release_group,
            version,
            now(),
        ))
    }

    pub fn log_subtitle(
        &self,
        show_id: i64,
        season: u32,
        episode: u32,
        status: CompositeStatus,
        subtitle: &SubtitleResult,
    ) -> Result<i64, HistoryError> {
        self.append(&subtitle_event(
            show_id, season, episode, status, subtitle, now(),
        ))
    }

    pub fn log_failed<E: Episode>(
        &self,
        episode: &E,
        release: &str,
        provider: Option<&str>,
    ) -> Result<i64, HistoryError> {
        self.append(&failed_event(episode, release, provider, now()))
    }
}

/// Local time truncated to whole seconds.
fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
