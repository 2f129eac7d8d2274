//! Display Formatting
//!
//! Conversions shared by the console pages: clip offsets (`m:ss` on screen,
//! whole seconds on the wire) and localised rendering of server timestamps.

use chrono::{DateTime, NaiveDateTime, TimeZone};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Rendering used for every timestamp shown in the console
pub const DATETIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Naive layouts the backend emits (`strftime` log stamps and `isoformat()`)
const NAIVE_LAYOUTS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// An offset into a media clip, in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClipTime(u32);

impl ClipTime {
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    pub fn seconds(self) -> u32 {
        self.0
    }

    pub fn minutes_part(self) -> u32 {
        self.0 / 60
    }

    pub fn seconds_part(self) -> u32 {
        self.0 % 60
    }
}

impl fmt::Display for ClipTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.minutes_part(), self.seconds_part())
    }
}

/// Rejected clip time input
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClipTimeError {
    #[error("Invalid time {0:?}: expected m:ss")]
    Malformed(String),

    #[error("Invalid time {0:?}: seconds must be below 60")]
    SecondsOutOfRange(String),

    #[error("Invalid time {0:?}: value too large")]
    Overflow(String),
}

fn clip_time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ASCII digits only; `\d` would admit other Unicode digits
    PATTERN.get_or_init(|| Regex::new(r"^([0-9]+):([0-9]{1,2})$").expect("static regex"))
}

impl FromStr for ClipTime {
    type Err = ClipTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = clip_time_pattern()
            .captures(trimmed)
            .ok_or_else(|| ClipTimeError::Malformed(s.to_string()))?;

        let minutes: u32 = caps[1]
            .parse()
            .map_err(|_| ClipTimeError::Overflow(s.to_string()))?;
        let seconds: u32 = caps[2]
            .parse()
            .map_err(|_| ClipTimeError::Malformed(s.to_string()))?;

        if seconds >= 60 {
            return Err(ClipTimeError::SecondsOutOfRange(s.to_string()));
        }

        minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .map(ClipTime)
            .ok_or_else(|| ClipTimeError::Overflow(s.to_string()))
    }
}

/// Parse an optional `m:ss` form field. Blank input means "not set".
pub fn parse_clip_field(input: &str) -> Result<Option<ClipTime>, ClipTimeError> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input.parse().map(Some)
}

/// Convert an `m:ss` form field into the seconds value sent to the backend.
///
/// Blank input maps to an empty string; malformed input is rejected instead
/// of being sent.
pub fn time_to_seconds(input: &str) -> Result<String, ClipTimeError> {
    Ok(parse_clip_field(input)?
        .map(|t| t.seconds().to_string())
        .unwrap_or_default())
}

/// Convert a seconds value from the backend into `m:ss` for display.
/// A missing value maps to an empty string.
pub fn seconds_to_time(seconds: Option<u32>) -> String {
    seconds
        .map(|s| ClipTime::from_seconds(s).to_string())
        .unwrap_or_default()
}

/// Render a server timestamp in the local timezone.
///
/// `None` or blank renders as `N/A`; text that is not a recognised
/// timestamp is shown unchanged.
pub fn format_datetime(raw: Option<&str>) -> String {
    format_datetime_in(raw, &chrono::Local)
}

/// Render a server timestamp in the given timezone
pub fn format_datetime_in<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let raw = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return "N/A".to_string(),
    };

    match parse_timestamp(raw, tz) {
        Some(dt) => dt.format(DATETIME_DISPLAY_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// Parse RFC 3339 or a naive timestamp, treating naive values as wall time in `tz`
pub fn parse_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz));
    }

    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_clip_time_parse() {
        assert_eq!("1:15".parse::<ClipTime>().unwrap().seconds(), 75);
        assert_eq!("0:00".parse::<ClipTime>().unwrap().seconds(), 0);
        assert_eq!(" 12:05 ".parse::<ClipTime>().unwrap().seconds(), 725);
        assert_eq!("0:7".parse::<ClipTime>().unwrap().seconds(), 7);
    }

    #[test]
    fn test_clip_time_rejects_malformed() {
        for input in ["abc", "1:xx", "1:2:3", ":30", "1:", "-1:30", "1.5:00", "1:234"] {
            assert!(
                matches!(input.parse::<ClipTime>(), Err(ClipTimeError::Malformed(_))),
                "{input:?} should be malformed"
            );
        }
        assert_eq!(
            "1:60".parse::<ClipTime>(),
            Err(ClipTimeError::SecondsOutOfRange("1:60".to_string()))
        );
        assert!(matches!(
            "99999999999:00".parse::<ClipTime>(),
            Err(ClipTimeError::Overflow(_))
        ));
    }

    #[test]
    fn test_display_pads_seconds() {
        assert_eq!(ClipTime::from_seconds(65).to_string(), "1:05");
        assert_eq!(ClipTime::from_seconds(600).to_string(), "10:00");
        assert_eq!(seconds_to_time(Some(59)), "0:59");
    }

    #[test]
    fn test_empty_maps_to_empty() {
        assert_eq!(time_to_seconds("").unwrap(), "");
        assert_eq!(time_to_seconds("   ").unwrap(), "");
        assert_eq!(seconds_to_time(None), "");
    }

    #[test]
    fn test_seconds_to_time_inverts_time_to_seconds() {
        for minutes in [0u32, 1, 9, 10, 59, 61, 125] {
            for seconds in 0..60u32 {
                let text = format!("{}:{:02}", minutes, seconds);
                let wire = time_to_seconds(&text).unwrap();
                let back = seconds_to_time(Some(wire.parse().unwrap()));
                assert_eq!(back, text);
            }
        }
    }

    #[test]
    fn test_time_to_seconds_rejects_instead_of_nan() {
        assert!(time_to_seconds("ab:cd").is_err());
        assert!(time_to_seconds("5").is_err());
    }

    #[test]
    fn test_format_datetime_rfc3339() {
        let rendered = format_datetime_in(Some("2024-01-01T10:00:00Z"), &Utc);
        assert_eq!(rendered, "2024-01-01 10:00:00");

        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let rendered = format_datetime_in(Some("2024-01-01T10:00:00Z"), &tokyo);
        assert_eq!(rendered, "2024-01-01 19:00:00");
    }

    #[test]
    fn test_format_datetime_naive_is_local_wall_time() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(
            format_datetime_in(Some("2024-03-05 08:30:00"), &tokyo),
            "2024-03-05 08:30:00"
        );
        assert_eq!(
            format_datetime_in(Some("2024-03-05T08:30:00.123456"), &tokyo),
            "2024-03-05 08:30:00"
        );
    }

    #[test]
    fn test_format_datetime_missing_or_garbage() {
        assert_eq!(format_datetime_in(None, &Utc), "N/A");
        assert_eq!(format_datetime_in(Some(""), &Utc), "N/A");
        assert_eq!(format_datetime_in(Some("soon"), &Utc), "soon");
    }
}
