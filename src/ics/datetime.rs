//! Date and timestamp decoding.
//!
//! The interchange format carries two mutually exclusive encodings,
//! distinguished by the content line's parameter:
//!
//! - no parameter or `TZID=...`: `YYYYMMDDTHHMMSS[Z]`, always read as UTC
//!   (zone conversion is deliberately not implemented, the TZID value is
//!   not inspected);
//! - `VALUE=DATE`: `YYYYMMDD`, an all-day date. All-day *end* dates are
//!   exclusive on the wire, so they decode to the last millisecond of the
//!   previous day; starts decode to midnight. Day boundaries are UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::error::{AcalResult, ParseError};
use crate::ics::line::ContentLine;

/// Whether a value sits at the start or the end of its event's range;
/// decides which side of an all-day date to land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePosition {
    Start,
    End,
}

/// Decode a DTSTART/DTEND content line into a UTC instant.
pub fn decode_instant(line: &ContentLine, position: DatePosition) -> AcalResult<DateTime<Utc>> {
    match &line.param {
        None => decode_timestamp(&line.value),
        Some((name, _)) if name == "TZID" => decode_timestamp(&line.value),
        Some((name, value)) if name == "VALUE" && value == "DATE" => {
            decode_date(&line.value, position)
        }
        Some((name, value)) => Err(ParseError::Temporal(format!(
            "{};{}={}:{}",
            line.key, name, value, line.value
        ))),
    }
}

fn decode_timestamp(value: &str) -> AcalResult<DateTime<Utc>> {
    let bare = value.strip_suffix('Z').unwrap_or(value);
    let naive = NaiveDateTime::parse_from_str(bare, "%Y%m%dT%H%M%S")
        .map_err(|_| ParseError::Temporal(value.to_string()))?;
    Ok(naive.and_utc())
}

fn decode_date(value: &str, position: DatePosition) -> AcalResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|_| ParseError::Temporal(value.to_string()))?;

    let instant = match position {
        DatePosition::Start => date.and_hms_opt(0, 0, 0).unwrap(),
        // Exclusive on the wire: step back one day, take its last millisecond.
        DatePosition::End => (date - Duration::days(1))
            .and_hms_milli_opt(23, 59, 59, 999)
            .unwrap(),
    };
    Ok(instant.and_utc())
}
