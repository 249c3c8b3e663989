//! Composite episode status: an action and a quality packed into one integer.
//!
//! The packed form is `action_slot + 100 * quality_flag`. Action slots stay
//! below 100 and every quality is a single bit flag, so each (action, quality)
//! pair maps to a distinct integer and decoding is exact.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Multiplier separating the action slot from the quality flag.
const QUALITY_STRIDE: i64 = 100;

/// Lifecycle action recorded against an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Unknown,
    Unaired,
    Snatched,
    Wanted,
    Downloaded,
    Skipped,
    Archived,
    Ignored,
    SnatchedProper,
    Subtitled,
    Failed,
    SnatchedBest,
}

impl Action {
    /// Every action, in code order.
    pub const ALL: [Action; 12] = [
        Action::Unknown,
        Action::Unaired,
        Action::Snatched,
        Action::Wanted,
        Action::Downloaded,
        Action::Skipped,
        Action::Archived,
        Action::Ignored,
        Action::SnatchedProper,
        Action::Subtitled,
        Action::Failed,
        Action::SnatchedBest,
    ];

    /// Slot occupied in the packed status. `Unknown` takes the free slot 0.
    pub fn code(self) -> i64 {
        match self {
            Action::Unknown => 0,
            Action::Unaired => 1,
            Action::Snatched => 2,
            Action::Wanted => 3,
            Action::Downloaded => 4,
            Action::Skipped => 5,
            Action::Archived => 6,
            Action::Ignored => 7,
            Action::SnatchedProper => 9,
            Action::Subtitled => 10,
            Action::Failed => 11,
            Action::SnatchedBest => 12,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Unknown => "Unknown",
            Action::Unaired => "Unaired",
            Action::Snatched => "Snatched",
            Action::Wanted => "Wanted",
            Action::Downloaded => "Downloaded",
            Action::Skipped => "Skipped",
            Action::Archived => "Archived",
            Action::Ignored => "Ignored",
            Action::SnatchedProper => "Snatched (Proper)",
            Action::Subtitled => "Subtitled",
            Action::Failed => "Failed",
            Action::SnatchedBest => "Snatched (Best)",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Release quality, ordered from lowest to highest.
///
/// `Unknown` sorts last and is also what [`decode`] reports for status values
/// it does not recognise.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    None,
    Sdtv,
    Sddvd,
    Hdtv,
    RawHdtv,
    FullHdtv,
    HdWebDl,
    FullHdWebDl,
    HdBluray,
    FullHdBluray,
    Uhd4kTv,
    Uhd4kWebDl,
    Uhd4kBluray,
    Uhd8kTv,
    Uhd8kWebDl,
    Uhd8kBluray,
    Unknown,
}

impl Quality {
    /// Every quality, in ascending order.
    pub const ALL: [Quality; 17] = [
        Quality::None,
        Quality::Sdtv,
        Quality::Sddvd,
        Quality::Hdtv,
        Quality::RawHdtv,
        Quality::FullHdtv,
        Quality::HdWebDl,
        Quality::FullHdWebDl,
        Quality::HdBluray,
        Quality::FullHdBluray,
        Quality::Uhd4kTv,
        Quality::Uhd4kWebDl,
        Quality::Uhd4kBluray,
        Quality::Uhd8kTv,
        Quality::Uhd8kWebDl,
        Quality::Uhd8kBluray,
        Quality::Unknown,
    ];

    /// Bit flag stored for this quality (`None` is 0, `Unknown` is `1 << 15`).
    pub fn flag(self) -> i64 {
        match self {
            Quality::None => 0,
            Quality::Sdtv => 1,
            Quality::Sddvd => 1 << 1,
            Quality::Hdtv => 1 << 2,
            Quality::RawHdtv => 1 << 3,
            Quality::FullHdtv => 1 << 4,
            Quality::HdWebDl => 1 << 5,
            Quality::FullHdWebDl => 1 << 6,
            Quality::HdBluray => 1 << 7,
            Quality::FullHdBluray => 1 << 8,
            Quality::Uhd4kTv => 1 << 9,
            Quality::Uhd4kWebDl => 1 << 10,
            Quality::Uhd4kBluray => 1 << 11,
            Quality::Uhd8kTv => 1 << 12,
            Quality::Uhd8kWebDl => 1 << 13,
            Quality::Uhd8kBluray => 1 << 14,
            Quality::Unknown => 1 << 15,
        }
    }

    pub fn from_flag(flag: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|q| q.flag() == flag)
    }

    pub fn name(self) -> &'static str {
        match self {
            Quality::None => "N/A",
            Quality::Sdtv => "SDTV",
            Quality::Sddvd => "SD DVD",
            Quality::Hdtv => "720p HDTV",
            Quality::RawHdtv => "RawHD",
            Quality::FullHdtv => "1080p HDTV",
            Quality::HdWebDl => "720p WEB-DL",
            Quality::FullHdWebDl => "1080p WEB-DL",
            Quality::HdBluray => "720p BluRay",
            Quality::FullHdBluray => "1080p BluRay",
            Quality::Uhd4kTv => "4K UHD TV",
            Quality::Uhd4kWebDl => "4K UHD WEB-DL",
            Quality::Uhd4kBluray => "4K UHD BluRay",
            Quality::Uhd8kTv => "8K UHD TV",
            Quality::Uhd8kWebDl => "8K UHD WEB-DL",
            Quality::Uhd8kBluray => "8K UHD BluRay",
            Quality::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A packed (action, quality) status as stored in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeStatus(pub i64);

impl CompositeStatus {
    pub fn new(action: Action, quality: Quality) -> Self {
        encode(action, quality)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn action(self) -> Action {
        decode(self).0
    }

    pub fn quality(self) -> Quality {
        decode(self).1
    }

    /// Same quality, different action.
    pub fn with_action(self, action: Action) -> Self {
        encode(action, self.quality())
    }
}

impl From<i64> for CompositeStatus {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for CompositeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (action, quality) = decode(*self);
        write!(f, "{} ({})", action, quality)
    }
}

/// Pack an action and a quality into a single status value.
pub fn encode(action: Action, quality: Quality) -> CompositeStatus {
    CompositeStatus(action.code() + QUALITY_STRIDE * quality.flag())
}

/// Split a status value back into its action and quality.
///
/// Values that do not correspond to a known pair (negative numbers, unused
/// action slots, combined quality flags) decode to `(Unknown, Unknown)`.
pub fn decode(status: CompositeStatus) -> (Action, Quality) {
    const UNRECOGNISED: (Action, Quality) = (Action::Unknown, Quality::Unknown);

    if status.0 < 0 {
        return UNRECOGNISED;
    }

    let action = Action::from_code(status.0 % QUALITY_STRIDE);
    let quality = Quality::from_flag(status.0 / QUALITY_STRIDE);

    match (action, quality) {
        (Some(action), Some(quality)) => (action, quality),
        _ => UNRECOGNISED,
    }
}
