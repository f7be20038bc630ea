//! Filename derivation for downloaded recordings.
//!
//! A recording file's start time arrives as UTC (`2023-09-05T05:00:32Z`) and
//! its meeting carries a descriptor such as `GMT+08:00`. Files are named after
//! the instant re-expressed in a single target zone (Europe/Madrid unless
//! configured otherwise), with colons swapped for hyphens so the name is safe
//! on every filesystem: `2023-09-05T07-00-32+0200.mp4`.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TARGET_ZONE: Tz = chrono_tz::Europe::Madrid;
pub const RECORDING_EXTENSION: &str = "mp4";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const FILENAME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%z";
const DESCRIPTOR_PREFIX: &str = "GMT";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilenameError {
    #[error("invalid timestamp {value:?}: expected YYYY-MM-DDTHH:MM:SSZ")]
    InvalidTimestamp { value: String },

    #[error("invalid timezone {value:?}: {reason}")]
    InvalidTimezone { value: String, reason: &'static str },

    #[error("unknown target timezone {value:?}")]
    UnknownTargetZone { value: String },
}

impl FilenameError {
    fn timezone(value: &str, reason: &'static str) -> Self {
        FilenameError::InvalidTimezone {
            value: value.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

/// A parsed `GMT±H[H]:MM` descriptor as reported by the recordings API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneDescriptor {
    pub sign: Sign,
    pub hours: u8,
    /// Parsed for validation only. [`TimezoneDescriptor::offset`] ignores it.
    pub minutes: u8,
}

impl TimezoneDescriptor {
    pub fn parse(raw: &str) -> Result<Self, FilenameError> {
        let rest = raw
            .strip_prefix(DESCRIPTOR_PREFIX)
            .ok_or_else(|| FilenameError::timezone(raw, "expected a `GMT` prefix"))?;

        let mut chars = rest.chars();
        let sign = match chars.next() {
            Some('+') => Sign::Plus,
            Some('-') => Sign::Minus,
            _ => return Err(FilenameError::timezone(raw, "missing `+` or `-` sign")),
        };

        let (hours, minutes) = chars
            .as_str()
            .split_once(':')
            .ok_or_else(|| FilenameError::timezone(raw, "missing `:` between hours and minutes"))?;

        if hours.is_empty() || hours.len() > 2 || !hours.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FilenameError::timezone(
                raw,
                "hour offset must be one or two digits",
            ));
        }
        if minutes.len() != 2 || !minutes.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FilenameError::timezone(
                raw,
                "minute offset must be two digits",
            ));
        }

        let hours: u8 = hours
            .parse()
            .map_err(|_| FilenameError::timezone(raw, "hour offset is not a number"))?;
        let minutes: u8 = minutes
            .parse()
            .map_err(|_| FilenameError::timezone(raw, "minute offset is not a number"))?;

        if hours > 23 {
            return Err(FilenameError::timezone(raw, "hour offset out of range"));
        }
        if minutes > 59 {
            return Err(FilenameError::timezone(raw, "minute offset out of range"));
        }

        Ok(Self {
            sign,
            hours,
            minutes,
        })
    }

    /// Whole-hour offset described by this descriptor. Minutes are dropped,
    /// so half-hour zones such as `GMT+05:30` come out as `+05:00`.
    pub fn offset(&self) -> FixedOffset {
        let seconds = i32::from(self.hours) * 3600;
        let seconds = match self.sign {
            Sign::Plus => seconds,
            Sign::Minus => -seconds,
        };
        // hours <= 23 is enforced by parse, well inside FixedOffset's range
        FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
    }
}

impl fmt::Display for TimezoneDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.sign {
            Sign::Plus => '+',
            Sign::Minus => '-',
        };
        write!(
            f,
            "{}{}{:02}:{:02}",
            DESCRIPTOR_PREFIX, sign, self.hours, self.minutes
        )
    }
}

/// Parse a recording start time. Only the exact `YYYY-MM-DDTHH:MM:SSZ` shape
/// is accepted.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, FilenameError> {
    let invalid = || FilenameError::InvalidTimestamp {
        value: raw.to_string(),
    };
    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|_| invalid())?;
    // chrono accepts unpadded fields; the canonical form must round-trip.
    if naive.format(TIMESTAMP_FORMAT).to_string() != raw {
        return Err(invalid());
    }
    Ok(Utc.from_utc_datetime(&naive))
}

/// Converts recording start times into filenames in a fixed target zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilenameDeriver {
    target: Tz,
}

impl Default for FilenameDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_ZONE)
    }
}

impl FilenameDeriver {
    pub fn new(target: Tz) -> Self {
        Self { target }
    }

    /// Build a deriver from an IANA zone name such as `Europe/Madrid`.
    pub fn from_name(name: &str) -> Result<Self, FilenameError> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| FilenameError::UnknownTargetZone {
                value: name.to_string(),
            })
    }

    pub fn target(&self) -> Tz {
        self.target
    }

    /// Derive the bare filename (no extension) for a recording that started
    /// at `timestamp` in a meeting whose timezone is `timezone`.
    pub fn derive(&self, timestamp: &str, timezone: &str) -> Result<String, FilenameError> {
        let instant = parse_timestamp(timestamp)?;
        let descriptor = TimezoneDescriptor::parse(timezone)?;

        let recorded = instant.with_timezone(&descriptor.offset());
        debug!(
            "Recording started {} in {} ({})",
            instant, descriptor, recorded
        );

        let local = recorded.with_timezone(&self.target);
        let filename = local.format(FILENAME_FORMAT).to_string();
        debug!("Filename for {} in {}: {}", timestamp, self.target, filename);
        Ok(filename)
    }

    /// Same as [`FilenameDeriver::derive`] with the `.mp4` extension appended.
    pub fn recording_filename(
        &self,
        timestamp: &str,
        timezone: &str,
    ) -> Result<String, FilenameError> {
        let stem = self.derive(timestamp, timezone)?;
        Ok(format!("{stem}.{RECORDING_EXTENSION}"))
    }
}

/// Derive a filename in the default target zone (Europe/Madrid).
pub fn derive_filename(timestamp: &str, timezone: &str) -> Result<String, FilenameError> {
    FilenameDeriver::default().derive(timestamp, timezone)
}
