//! Parsing for the compact `PT#H#M#S` durations returned by the videos
//! endpoint.

use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Length of a video in whole seconds, or `Unknown` when the API value could
/// not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoDuration {
    Seconds(u64),
    #[default]
    Unknown,
}

impl VideoDuration {
    pub fn as_secs(self) -> Option<u64> {
        match self {
            VideoDuration::Seconds(secs) => Some(secs),
            VideoDuration::Unknown => None,
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, VideoDuration::Unknown)
    }
}

impl fmt::Display for VideoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoDuration::Seconds(secs) => write!(f, "{secs}s"),
            VideoDuration::Unknown => f.write_str("unknown"),
        }
    }
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^PT(?:([0-9]+)H)?(?:([0-9]+)M)?(?:([0-9]+)S)?$")
            .expect("duration pattern is valid")
    })
}

/// Converts `PT1H2M3S`-style text into seconds.
///
/// Anything that does not match the anchored pattern, including the empty
/// string or a value too large to represent, yields
/// [`VideoDuration::Unknown`]. This function never fails.
pub fn parse_duration(text: &str) -> VideoDuration {
    let Some(caps) = pattern().captures(text) else {
        return VideoDuration::Unknown;
    };

    let total = total_seconds(&caps);
    total.map_or(VideoDuration::Unknown, VideoDuration::Seconds)
}

fn total_seconds(caps: &Captures<'_>) -> Option<u64> {
    let component = |index: usize| -> Option<u64> {
        caps.get(index).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    let hours = component(1)?;
    let minutes = component(2)?;
    let seconds = component(3)?;
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_and_partial_components() {
        assert_eq!(parse_duration("PT1H2M3S"), VideoDuration::Seconds(3723));
        assert_eq!(parse_duration("PT45S"), VideoDuration::Seconds(45));
        assert_eq!(parse_duration("PT2M"), VideoDuration::Seconds(120));
        assert_eq!(parse_duration("PT1H"), VideoDuration::Seconds(3600));
        assert_eq!(parse_duration("PT10M0S"), VideoDuration::Seconds(600));
    }

    #[test]
    fn bare_prefix_is_zero_seconds() {
        assert_eq!(parse_duration("PT"), VideoDuration::Seconds(0));
    }

    #[test]
    fn malformed_input_is_unknown() {
        for text in [
            "",
            "garbage",
            "P1DT2H",
            "PT1S2M",
            "pt5m",
            " PT5M",
            "PT5M ",
            "PT-5S",
            "PT1.5S",
        ] {
            assert_eq!(parse_duration(text), VideoDuration::Unknown, "{text:?}");
        }
    }

    #[test]
    fn overflow_is_unknown() {
        assert_eq!(
            parse_duration("PT99999999999999999999H"),
            VideoDuration::Unknown
        );
        assert_eq!(
            parse_duration("PT18446744073709551615H"),
            VideoDuration::Unknown
        );
    }

    #[test]
    fn display_and_accessors() {
        assert_eq!(VideoDuration::Seconds(61).to_string(), "61s");
        assert_eq!(VideoDuration::Unknown.to_string(), "unknown");
        assert_eq!(VideoDuration::Seconds(5).as_secs(), Some(5));
        assert!(VideoDuration::Unknown.is_unknown());
    }
}
