//! Derived temporal features on top of the hourly aggregate.

use std::fmt;

use chrono::{Datelike, Timelike};

use crate::aggregate::{HourlyRow, HourlyTable};
use crate::time_key::{self, TimeKey};

/// Hourly row plus the columns derived from its timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedHourlyRow {
    pub hourly: HourlyRow,
    /// Monday = 0 ... Sunday = 6.
    pub weekday: u32,
    pub hour: u32,
    /// Minutes summed across every device column of the table.
    pub sum_minutes: i64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl EnrichedHourlyRow {
    pub fn from_hourly(hourly: HourlyRow) -> Self {
        let time = hourly.time;
        Self {
            weekday: time_key::weekday_index(&time),
            hour: time.hour(),
            sum_minutes: hourly.total(),
            year: time.year(),
            month: time.month(),
            day: time.day(),
            hourly,
        }
    }

    /// Recompute every derived field from the row's own time and counts.
    pub fn refresh(&mut self) {
        *self = Self::from_hourly(self.hourly.clone());
    }

    pub fn key(&self) -> TimeKey {
        TimeKey::new(self.year, self.month, self.day, self.hour)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichedTable {
    pub devices: Vec<String>,
    pub rows: Vec<EnrichedHourlyRow>,
}

impl EnrichedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for EnrichedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<14}", "time")?;
        for device in &self.devices {
            write!(f, "{:>6}", device)?;
        }
        write!(f, "{:>9}{:>6}{:>13}", "weekday", "hour", "sum_minutes")?;
        for row in &self.rows {
            writeln!(f)?;
            write!(f, "{:<14}", row.hourly.label())?;
            for count in &row.hourly.counts {
                write!(f, "{:>6}", count)?;
            }
            write!(f, "{:>9}{:>6}{:>13}", row.weekday, row.hour, row.sum_minutes)?;
        }
        Ok(())
    }
}

/// Add weekday, hour, date parts and `sum_minutes` to every hourly row.
///
/// `sum_minutes` covers every device column the table carries, so a device
/// added to the source CSV is included without code changes.
pub fn enrich(table: HourlyTable) -> EnrichedTable {
    let rows = table
        .rows
        .into_iter()
        .map(EnrichedHourlyRow::from_hourly)
        .collect();

    EnrichedTable {
        devices: table.devices,
        rows,
    }
}
