//! Projection of ship-date strings into a zone-free, millisecond-precision form.
//!
//! The service echoes timestamps with a different fractional precision and zone
//! notation than the one submitted, so both sides are reduced to
//! `YYYY-MM-DDTHH:mm:ss.SSS` before they are compared. The zone is dropped, not
//! converted: two timestamps only normalize to the same string when they share
//! the same wall clock.

use std::fmt;

use chrono::{FixedOffset, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::FormatError;

const CANONICAL: &str = "%Y-%m-%dT%H:%M:%S%.3f";
const WALL_CLOCK: &str = "%Y-%m-%dT%H:%M:%S";
/// Byte layout of the wall-clock part: `D` is an ASCII digit, anything else is literal.
const WALL_CLOCK_LAYOUT: &[u8] = b"DDDD-DD-DDTDD:DD:DD";

/// Declared shape of a raw timestamp string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// `2024-06-12T08:22:23.354Z`
    UtcMillis,
    /// `2024-06-12T08:22:23.3540+00:00`, or with a literal `Z` in place of the offset.
    OffsetTenthMillis,
    /// `2024-06-12T08:22:23.354`, the output of [`normalize`].
    Normalized,
    /// Any chrono pattern describing a zone-free local date-time.
    Pattern(String),
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampFormat::UtcMillis => f.write_str("utc_millis"),
            TimestampFormat::OffsetTenthMillis => f.write_str("offset_tenth_millis"),
            TimestampFormat::Normalized => f.write_str("normalized"),
            TimestampFormat::Pattern(pattern) => write!(f, "pattern {pattern:?}"),
        }
    }
}

/// Normalize `raw` (declared as `format`) into `YYYY-MM-DDTHH:mm:ss.SSS`.
///
/// Fractional digits past the third are truncated.
pub fn normalize(raw: &str, format: &TimestampFormat) -> Result<String, FormatError> {
    parse_wall_clock(raw, format).map(|parsed| parsed.format(CANONICAL).to_string())
}

/// Parse `raw` into its wall-clock date-time, discarding any zone designator.
pub fn parse_wall_clock(raw: &str, format: &TimestampFormat) -> Result<NaiveDateTime, FormatError> {
    let fail = |reason: String| FormatError::new(raw, format, reason);
    match format {
        TimestampFormat::UtcMillis => {
            let parts = Parts::split(raw).map_err(fail)?;
            parts.expect_fraction_digits(3).map_err(fail)?;
            if parts.zone != "Z" {
                return Err(fail(format!(
                    "expected literal `Z` suffix, found {:?}",
                    parts.zone
                )));
            }
            parts.to_naive().map_err(fail)
        }
        TimestampFormat::OffsetTenthMillis => {
            let parts = Parts::split(raw).map_err(fail)?;
            parts.expect_fraction_digits(4).map_err(fail)?;
            check_offset(parts.zone).map_err(fail)?;
            parts.to_naive().map_err(fail)
        }
        TimestampFormat::Normalized => {
            let parts = Parts::split(raw).map_err(fail)?;
            parts.expect_fraction_digits(3).map_err(fail)?;
            if !parts.zone.is_empty() {
                return Err(fail(format!("unexpected zone {:?}", parts.zone)));
            }
            parts.to_naive().map_err(fail)
        }
        TimestampFormat::Pattern(pattern) => {
            NaiveDateTime::parse_from_str(raw, pattern).map_err(|err| fail(err.to_string()))
        }
    }
}

/// Looser comparison kept as a fallback policy: drop the last five characters
/// of the returned value (its zone suffix) and look for the remainder inside
/// the submitted value.
pub fn suffix_trim_matches(submitted: &str, returned: &str) -> bool {
    match returned.char_indices().rev().nth(4) {
        Some((cut, _)) if cut > 0 => submitted.contains(&returned[..cut]),
        _ => false,
    }
}

struct Parts<'a> {
    wall: &'a str,
    fraction: &'a str,
    zone: &'a str,
}

impl<'a> Parts<'a> {
    fn split(raw: &'a str) -> Result<Self, String> {
        let (wall, rest) = raw
            .split_once('.')
            .ok_or_else(|| "missing fractional seconds".to_string())?;
        if !matches_layout(wall) {
            return Err(format!("malformed date-time part {wall:?}"));
        }
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (fraction, zone) = rest.split_at(digits);
        Ok(Self {
            wall,
            fraction,
            zone,
        })
    }

    fn expect_fraction_digits(&self, count: usize) -> Result<(), String> {
        if self.fraction.len() == count {
            Ok(())
        } else {
            Err(format!(
                "expected {count} fractional digits, found {}",
                self.fraction.len()
            ))
        }
    }

    fn to_naive(&self) -> Result<NaiveDateTime, String> {
        let wall =
            NaiveDateTime::parse_from_str(self.wall, WALL_CLOCK).map_err(|err| err.to_string())?;
        // chrono reads second 60 as a leap second carried in the nanoseconds.
        if wall.nanosecond() >= 1_000_000_000 {
            return Err(format!("second out of range in {:?}", self.wall));
        }
        let nanos: u32 = format!("{:0<9}", self.fraction)
            .parse()
            .map_err(|_| format!("invalid fraction {:?}", self.fraction))?;
        wall.with_nanosecond(nanos)
            .ok_or_else(|| format!("fraction {:?} out of range", self.fraction))
    }
}

fn matches_layout(wall: &str) -> bool {
    let bytes = wall.as_bytes();
    bytes.len() == WALL_CLOCK_LAYOUT.len()
        && bytes
            .iter()
            .zip(WALL_CLOCK_LAYOUT)
            .all(|(&byte, &expected)| match expected {
                b'D' => byte.is_ascii_digit(),
                literal => byte == literal,
            })
}

fn check_offset(zone: &str) -> Result<(), String> {
    if zone == "Z" {
        return Ok(());
    }
    let bytes = zone.as_bytes();
    let well_formed = bytes.len() == 6
        && matches!(bytes[0], b'+' | b'-')
        && bytes[3] == b':'
        && [1, 2, 4, 5].iter().all(|&i| bytes[i].is_ascii_digit());
    if !well_formed {
        return Err(format!("expected `Z` or a ±HH:MM offset, found {zone:?}"));
    }
    let hours: i32 = zone[1..3].parse().map_err(|_| format!("bad offset {zone:?}"))?;
    let minutes: i32 = zone[4..6].parse().map_err(|_| format!("bad offset {zone:?}"))?;
    if hours > 23 || minutes > 59 {
        return Err(format!("offset {zone:?} out of range"));
    }
    let sign = if bytes[0] == b'-' { -1 } else { 1 };
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .map(|_| ())
        .ok_or_else(|| format!("offset {zone:?} out of range"))
}
