use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::quality::{encode, Action, CompositeStatus, Quality};

/// Format of the `date` column.
pub const DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Written to the `provider` column when no provider is known.
pub const PROVIDER_SENTINEL: &str = "-1";

/// Written to the `version` column when no version is tracked.
pub const VERSION_SENTINEL: i64 = -1;

/// Provider name recorded for snatches whose source is not known.
pub const UNKNOWN_PROVIDER: &str = "unknown";

/// Read-only view of an episode owned by the show/episode manager.
pub trait Episode {
    fn show_id(&self) -> i64;
    fn season(&self) -> u32;
    fn episode(&self) -> u32;
    /// Current composite status.
    fn status(&self) -> CompositeStatus;
}

impl<T: Episode + ?Sized> Episode for &T {
    fn show_id(&self) -> i64 {
        (**self).show_id()
    }

    fn season(&self) -> u32 {
        (**self).season()
    }

    fn episode(&self) -> u32 {
        (**self).episode()
    }

    fn status(&self) -> CompositeStatus {
        (**self).status()
    }
}

/// Plain episode values, for callers that hold no richer episode object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeSnapshot {
    pub show_id: i64,
    pub season: u32,
    pub episode: u32,
    pub status: CompositeStatus,
}

impl Episode for EpisodeSnapshot {
    fn show_id(&self) -> i64 {
        self.show_id
    }

    fn season(&self) -> u32 {
        self.season
    }

    fn episode(&self) -> u32 {
        self.episode
    }

    fn status(&self) -> CompositeStatus {
        self.status
    }
}

/// A release chosen for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnatchedRelease {
    /// Release name as listed by the provider.
    pub name: String,
    pub quality: Quality,
    /// Provider the release came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    /// PROPER/REPACK style tags found in the name.
    #[serde(default)]
    pub proper_tags: Vec<String>,
    #[serde(default)]
    pub manually_searched: bool,
}

impl SnatchedRelease {
    pub fn new(name: impl Into<String>, quality: Quality) -> Self {
        Self {
            name: name.into(),
            quality,
            provider: None,
            version: None,
            proper_tags: Vec::new(),
            manually_searched: false,
        }
    }
}

/// A downloaded subtitle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleResult {
    /// Language code (e.g., "eng")
    pub language: String,
    /// Subtitle source name
    pub provider: String,
}

/// One history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub action: CompositeStatus,
    /// Local time, second resolution.
    pub date: NaiveDateTime,
    pub show_id: i64,
    pub season: u32,
    pub episode: u32,
    pub quality: Quality,
    /// Release name, file name or subtitle language.
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(default)]
    pub proper_tags: Vec<String>,
    #[serde(default)]
    pub manually_searched: bool,
}

impl HistoryEvent {
    /// `date` column value.
    pub fn date_column(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// `provider` column value.
    pub fn provider_column(&self) -> &str {
        self.provider.as_deref().unwrap_or(PROVIDER_SENTINEL)
    }

    /// `version` column value.
    pub fn version_column(&self) -> i64 {
        self.version.unwrap_or(VERSION_SENTINEL)
    }

    /// `proper_tags` column value.
    pub fn proper_tags_column(&self) -> String {
        self.proper_tags.join("|")
    }
}

/// One snatch event per episode covered by the release.
pub fn snatch_events<E: Episode>(
    release: &SnatchedRelease,
    episodes: &[E],
    at: NaiveDateTime,
) -> Vec<HistoryEvent> {
    let provider = release
        .provider
        .clone()
        .unwrap_or_else(|| UNKNOWN_PROVIDER.to_string());

    episodes
        .iter()
        .map(|episode| HistoryEvent {
            action: encode(Action::Snatched, release.quality),
            date: at,
            show_id: episode.show_id(),
            season: episode.season(),
            episode: episode.episode(),
            quality: release.quality,
            resource: release.name.clone(),
            provider: Some(provider.clone()),
            version: release.version,
            proper_tags: release.proper_tags.clone(),
            manually_searched: release.manually_searched,
        })
        .collect()
}

/// Download event. The action is the episode's status at download time,
/// stored as-is; the release group stands in for the provider.
pub fn download_event<E: Episode>(
    episode: &E,
    filename: &str,
    quality: Quality,
    release_group: Option<&str>,
    version: Option<i64>,
    at: NaiveDateTime,
) -> HistoryEvent {
    HistoryEvent {
        action: episode.status(),
        date: at,
        show_id: episode.show_id(),
        season: episode.season(),
        episode: episode.episode(),
        quality,
        resource: filename.to_string(),
        provider: release_group
            .filter(|group| !group.is_empty())
            .map(str::to_string),
        version,
        proper_tags: Vec::new(),
        manually_searched: false,
    }
}

/// Subtitle event, keeping the quality carried by `status`.
pub fn subtitle_event(
    show_id: i64,
    season: u32,
    episode: u32,
    status: CompositeStatus,
    subtitle: &SubtitleResult,
    at: NaiveDateTime,
) -> HistoryEvent {
    let quality = status.quality();
    HistoryEvent {
        action: encode(Action::Subtitled, quality),
        date: at,
        show_id,
        season,
        episode,
        quality,
        resource: subtitle.language.clone(),
        provider: Some(subtitle.provider.clone()),
        version: None,
        proper_tags: Vec::new(),
        manually_searched: false,
    }
}

/// Failure event, keeping the quality of the episode's current status.
pub fn failed_event<E: Episode>(
    episode: &E,
    release: &str,
    provider: Option<&str>,
    at: NaiveDateTime,
) -> HistoryEvent {
    let quality = episode.status().quality();
    HistoryEvent {
        action: encode(Action::Failed, quality),
        date: at,
        show_id: episode.show_id(),
        season: episode.season(),
        episode: episode.episode(),
        quality,
        resource: release.to_string(),
        provider: provider.map(str::to_string),
        version: None,
        proper_tags: Vec::new(),
        manually_searched: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(10, 30, 5)
            .unwrap()
    }

    fn episode(number: u32, status: CompositeStatus) -> EpisodeSnapshot {
        EpisodeSnapshot {
            show_id: 73739,
            season: 1,
            episode: number,
            status,
        }
    }

    #[test]
    fn test_snatch_event() {
        let mut release = SnatchedRelease::new("Show.Name.S01E02.HDTV.x264", Quality::Hdtv);
        release.provider = Some("ProviderX".to_string());

        let wanted = encode(Action::Wanted, Quality::None);
        let events = snatch_events(&release, &[episode(2, wanted)], at());

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.action, encode(Action::Snatched, Quality::Hdtv));
        assert_eq!(event.resource, "Show.Name.S01E02.HDTV.x264");
        assert_eq!(event.provider.as_deref(), Some("ProviderX"));
        assert_eq!(event.quality, Quality::Hdtv);
        assert_eq!(event.episode, 2);
        assert_eq!(event.version_column(), -1);
    }

    #[test]
    fn test_snatch_multi_episode_release() {
        let mut release = SnatchedRelease::new("Show.Name.S01E01E02.720p", Quality::HdWebDl);
        release.proper_tags = vec!["PROPER".to_string(), "REPACK".to_string()];
        release.manually_searched = true;
        release.version = Some(2);

        let wanted = encode(Action::Wanted, Quality::None);
        let events = snatch_events(&release, &[episode(1, wanted), episode(2, wanted)], at());

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].episode, 1);
        assert_eq!(events[1].episode, 2);
        for event in &events {
            assert_eq!(event.provider.as_deref(), Some(UNKNOWN_PROVIDER));
            assert_eq!(event.proper_tags_column(), "PROPER|REPACK");
            assert!(event.manually_searched);
            assert_eq!(event.version, Some(2));
        }
    }

    #[test]
    fn test_download_event_keeps_raw_status() {
        let status = encode(Action::Downloaded, Quality::FullHdtv);
        let event = download_event(
            &episode(3, status),
            "Show.Name.S01E03.1080p.mkv",
            Quality::FullHdtv,
            Some("GROUP"),
            None,
            at(),
        );
        assert_eq!(event.action, status);
        assert_eq!(event.resource, "Show.Name.S01E03.1080p.mkv");
        assert_eq!(event.provider_column(), "GROUP");
    }

    #[test]
    fn test_download_event_without_release_group() {
        let status = encode(Action::Downloaded, Quality::Sdtv);
        let event = download_event(&episode(3, status), "f.avi", Quality::Sdtv, Some(""), None, at());
        assert_eq!(event.provider, None);
        assert_eq!(event.provider_column(), PROVIDER_SENTINEL);
    }

    #[test]
    fn test_subtitle_event() {
        let status = encode(Action::Downloaded, Quality::HdBluray);
        let subtitle = SubtitleResult {
            language: "eng".to_string(),
            provider: "opensubtitles".to_string(),
        };
        let event = subtitle_event(73739, 1, 4, status, &subtitle, at());

        assert_eq!(event.action, encode(Action::Subtitled, Quality::HdBluray));
        assert_eq!(event.quality, Quality::HdBluray);
        assert_eq!(event.resource, "eng");
        assert_eq!(event.provider.as_deref(), Some("opensubtitles"));
    }

    #[test]
    fn test_failed_event() {
        let status = encode(Action::Snatched, Quality::Hdtv);
        let event = failed_event(&episode(2, status), "bad-release", None, at());

        assert_eq!(event.action, encode(Action::Failed, Quality::Hdtv));
        assert_eq!(event.resource, "bad-release");
        assert_eq!(event.provider, None);
        assert_eq!(event.provider_column(), PROVIDER_SENTINEL);
    }

    #[test]
    fn test_date_column() {
        let event = failed_event(&episode(1, CompositeStatus(0)), "x", Some("p"), at());
        assert_eq!(event.date_column(), "20240615103005");
    }
}
