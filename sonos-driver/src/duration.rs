//! Track time codec
//!
//! Zone players report track length and elapsed time as `H:MM:SS` or
//! `HH:MM:SS`. Devices that cannot report a value (radio streams, line-in)
//! send [`NOT_IMPLEMENTED`] instead; callers check for it before parsing.

use std::time::Duration;
use thiserror::Error;

/// Placeholder devices send instead of a time they cannot report
pub const NOT_IMPLEMENTED: &str = "NOT_IMPLEMENTED";

/// A time string that does not have the `H:MM:SS` shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to parse duration from '{input}'")]
pub struct FormatError {
    pub input: String,
}

impl FormatError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

/// Parse `H:MM:SS` or `HH:MM:SS`. The whole input must match.
pub fn parse(text: &str) -> Result<Duration, FormatError> {
    let mut fields = text.split(':');
    let (hours, minutes, seconds) = match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(h), Some(m), Some(s), None) => (h, m, s),
        _ => return Err(FormatError::new(text)),
    };

    if !(1..=2).contains(&hours.len()) || minutes.len() != 2 || seconds.len() != 2 {
        return Err(FormatError::new(text));
    }

    let hours = digits(hours).ok_or_else(|| FormatError::new(text))?;
    let minutes = digits(minutes).ok_or_else(|| FormatError::new(text))?;
    let seconds = digits(seconds).ok_or_else(|| FormatError::new(text))?;
    if minutes > 59 || seconds > 59 {
        return Err(FormatError::new(text));
    }

    Ok(Duration::from_secs((hours * 60 + minutes) * 60 + seconds))
}

/// [`parse`], in whole milliseconds
pub fn parse_millis(text: &str) -> Result<u64, FormatError> {
    parse(text).map(|duration| duration.as_millis() as u64)
}

fn digits(field: &str) -> Option<u64> {
    if field.bytes().all(|b| b.is_ascii_digit()) {
        field.parse().ok()
    } else {
        None
    }
}
