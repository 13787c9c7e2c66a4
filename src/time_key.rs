//! Calendar fields derived from the timestamps of both datasets.
//!
//! Timestamps are parsed into `chrono` types once, at load time, and every
//! later comparison is done on those values instead of on the raw strings.
//! The wall-clock time is kept exactly as written: the UTC offset is
//! validated but not applied, so an hour bucket is the written date and hour.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::ParseError;

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%:z"];
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Key used to align gym usage with weather observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl TimeKey {
    pub fn new(year: i32, month: u32, day: u32, hour: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
        }
    }

    pub fn from_datetime(time: &NaiveDateTime) -> Self {
        Self {
            year: time.year(),
            month: time.month(),
            day: time.day(),
            hour: time.hour(),
        }
    }
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}",
            self.year, self.month, self.day, self.hour
        )
    }
}

/// Zero-padded `YYYY-MM-DD?HH:MM:SS` shape. Rejecting anything else keeps
/// non-padded values like `2020-4-24` out of the pipeline.
fn has_fixed_width_prefix(input: &str) -> bool {
    let bytes = input.as_bytes();
    if bytes.len() < 19 {
        return false;
    }
    bytes.iter().take(19).enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        10 => *b == b' ' || *b == b'T',
        13 | 16 => *b == b':',
        _ => b.is_ascii_digit(),
    })
}

/// Parse a usage timestamp such as `2020-04-24 00:30:00+00:00`.
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, ParseError> {
    let trimmed = input.trim();
    if !has_fixed_width_prefix(trimmed) {
        return Err(ParseError::Timestamp(input.to_string()));
    }

    for format in OFFSET_FORMATS {
        if let Ok(time) = DateTime::parse_from_str(trimmed, format) {
            return Ok(time.naive_local());
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(time) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(time);
        }
    }

    Err(ParseError::Timestamp(input.to_string()))
}

/// Parse a `YYYY-MM-DD` date. Anything after the first ten characters is
/// ignored, so a full timestamp is accepted as well.
pub fn parse_date(input: &str) -> Result<NaiveDate, ParseError> {
    let trimmed = input.trim();
    let date_part = trimmed
        .get(..10)
        .ok_or_else(|| ParseError::Date(input.to_string()))?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| ParseError::Date(input.to_string()))
}

/// Hour of day from a weather label such as `07:00`: the first two
/// characters, as an integer in `0..=23`.
pub fn parse_hour_label(input: &str) -> Result<u32, ParseError> {
    let digits = input
        .trim()
        .get(..2)
        .ok_or_else(|| ParseError::HourLabel(input.to_string()))?;
    match digits.parse::<u32>() {
        Ok(hour) if hour < 24 => Ok(hour),
        _ => Err(ParseError::HourLabel(input.to_string())),
    }
}

/// Day of the week, Monday = 0 ... Sunday = 6.
pub fn weekday_index(time: &NaiveDateTime) -> u32 {
    time.weekday().num_days_from_monday()
}

pub fn is_weekend(weekday: u32) -> bool {
    weekday == 5 || weekday == 6
}

/// Drop minutes, seconds and sub-seconds.
pub fn truncate_to_hour(time: &NaiveDateTime) -> NaiveDateTime {
    let hour = NaiveTime::from_hms_opt(time.hour(), 0, 0)
        .expect("hour taken from a valid time is always valid");
    time.date().and_time(hour)
}

/// Label of an hour bucket, `YYYY-MM-DDTHH`.
pub fn hour_label(time: &NaiveDateTime) -> String {
    time.format("%Y-%m-%dT%H").to_string()
}
