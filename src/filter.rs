//! Exclusion rules that turn search candidates into the published list.
//!
//! Rules run in a fixed order and the first match wins: a `#shorts` title
//! marker, then an unknown duration (subject to [`UnknownDurationPolicy`]),
//! then the short-form threshold. Survivors keep their search order and are
//! capped at [`FilterPolicy::max_count`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::duration::VideoDuration;
use crate::youtube::VideoCandidate;

pub const DEFAULT_SHORT_THRESHOLD_SECS: u64 = 60;
pub const DEFAULT_DESIRED_COUNT: usize = 24;
/// Matched case-insensitively anywhere in the title.
pub const SHORTS_MARKER: &str = "#shorts";

/// Durations keyed by video id. Ids that were not returned by the lookup are
/// treated as unknown.
pub type DurationMap = HashMap<String, VideoDuration>;

/// What to do with a candidate whose duration could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownDurationPolicy {
    /// Keep it; nothing proves it is a short.
    #[default]
    Lenient,
    /// Drop it; nothing proves it is not a short.
    Strict,
}

impl FromStr for UnknownDurationPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lenient" | "keep" => Ok(UnknownDurationPolicy::Lenient),
            "strict" | "drop" => Ok(UnknownDurationPolicy::Strict),
            other => Err(format!("unknown duration policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPolicy {
    /// Videos at or below this many seconds are short-form.
    pub short_threshold_secs: u64,
    pub unknown_duration: UnknownDurationPolicy,
    pub max_count: usize,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            short_threshold_secs: DEFAULT_SHORT_THRESHOLD_SECS,
            unknown_duration: UnknownDurationPolicy::default(),
            max_count: DEFAULT_DESIRED_COUNT,
        }
    }
}

/// Why a candidate was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    ShortsTitle,
    UnknownDuration,
    TooShort(u64),
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::ShortsTitle => f.write_str("title marked #shorts"),
            Exclusion::UnknownDuration => f.write_str("duration unknown"),
            Exclusion::TooShort(secs) => write!(f, "short-form ({secs}s)"),
        }
    }
}

/// A candidate that made it into the final list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredVideo {
    pub video: VideoCandidate,
    pub duration: VideoDuration,
}

impl FilterPolicy {
    /// Returns the first rule that excludes the candidate, or `None` to keep it.
    pub fn evaluate(
        &self,
        candidate: &VideoCandidate,
        duration: VideoDuration,
    ) -> Option<Exclusion> {
        if is_marked_short(&candidate.title) {
            return Some(Exclusion::ShortsTitle);
        }
        match duration {
            VideoDuration::Unknown => match self.unknown_duration {
                UnknownDurationPolicy::Lenient => None,
                UnknownDurationPolicy::Strict => Some(Exclusion::UnknownDuration),
            },
            VideoDuration::Seconds(secs) if secs <= self.short_threshold_secs => {
                Some(Exclusion::TooShort(secs))
            }
            VideoDuration::Seconds(_) => None,
        }
    }
}

pub fn is_marked_short(title: &str) -> bool {
    title.to_lowercase().contains(SHORTS_MARKER)
}

/// Applies `policy` to `candidates` in order and truncates the survivors.
pub fn filter_candidates(
    candidates: Vec<VideoCandidate>,
    durations: &DurationMap,
    policy: &FilterPolicy,
) -> Vec<FilteredVideo> {
    let mut kept = Vec::new();
    for video in candidates {
        if kept.len() == policy.max_count {
            break;
        }
        let duration = durations
            .get(&video.video_id)
            .copied()
            .unwrap_or(VideoDuration::Unknown);
        match policy.evaluate(&video, duration) {
            Some(reason) => {
                debug!(video_id = %video.video_id, %reason, "excluding video");
            }
            None => kept.push(FilteredVideo { video, duration }),
        }
    }
    kept
}
