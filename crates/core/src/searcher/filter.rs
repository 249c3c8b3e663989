//! Seeder threshold and field-presence filtering.

use tracing::debug;

use super::{CandidateRelease, SearchMode};

/// Drops candidates that are unseeded or incomplete. Order-preserving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultFilter {
    min_seeders: Option<u32>,
}

impl ResultFilter {
    pub fn new(min_seeders: Option<u32>) -> Self {
        Self { min_seeders }
    }

    /// Seeders a candidate needs: the configured minimum, but never below 1.
    pub fn seed_floor(&self) -> u32 {
        self.min_seeders.unwrap_or(0).max(1)
    }

    pub fn accepts(&self, candidate: &CandidateRelease) -> bool {
        !candidate.title.is_empty()
            && !candidate.link.is_empty()
            && candidate.seeders >= self.seed_floor()
    }

    /// Keep the candidates that pass. Rejections are logged only for term
    /// searches; the broad feed is too noisy for that.
    pub fn apply(&self, candidates: Vec<CandidateRelease>, mode: &SearchMode) -> Vec<CandidateRelease> {
        let floor = self.seed_floor();
        candidates
            .into_iter()
            .filter(|candidate| {
                let keep = self.accepts(candidate);
                if !keep && !mode.is_broad() {
                    debug!(
                        title = %candidate.title,
                        seeders = candidate.seeders,
                        min_seeders = floor,
                        "Discarding torrent because it doesn't meet the minimum seeders"
                    );
                }
                keep
            })
            .collect()
    }
}
