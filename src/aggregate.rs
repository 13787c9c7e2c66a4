//! Hourly aggregation of the raw usage counters.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

use crate::dataset::UsageTable;
use crate::error::PipelineError;
use crate::time_key;

/// Usage minutes of every device summed over one hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlyRow {
    /// Start of the hour bucket.
    pub time: NaiveDateTime,
    pub counts: Vec<i64>,
}

impl HourlyRow {
    /// Bucket label, `YYYY-MM-DDTHH`.
    pub fn label(&self) -> String {
        time_key::hour_label(&self.time)
    }

    /// Minutes summed across all devices.
    pub fn total(&self) -> i64 {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HourlyTable {
    pub devices: Vec<String>,
    pub rows: Vec<HourlyRow>,
}

impl HourlyTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of one device column across all rows.
    pub fn device_total(&self, device_idx: usize) -> i64 {
        self.rows
            .iter()
            .filter_map(|row| row.counts.get(device_idx))
            .sum()
    }
}

impl fmt::Display for HourlyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<14}", "time")?;
        for device in &self.devices {
            write!(f, "{:>7}", device)?;
        }
        for row in &self.rows {
            writeln!(f)?;
            write!(f, "{:<14}", row.label())?;
            for count in &row.counts {
                write!(f, "{:>7}", count)?;
            }
        }
        Ok(())
    }
}

/// Group raw rows by date and hour and sum every device column.
///
/// Buckets come out in ascending time order. An empty input is an upstream
/// failure, not an empty result.
pub fn aggregate_hourly(table: &UsageTable) -> Result<HourlyTable, PipelineError> {
    if table.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let width = table.devices.len();
    let mut buckets: BTreeMap<NaiveDateTime, Vec<i64>> = BTreeMap::new();

    for row in &table.rows {
        let hour = time_key::truncate_to_hour(&row.time);
        let sums = buckets.entry(hour).or_insert_with(|| vec![0; width]);
        for (idx, (sum, count)) in sums.iter_mut().zip(&row.counts).enumerate() {
            *sum = sum
                .checked_add(*count)
                .ok_or_else(|| PipelineError::CountOverflow {
                    hour: time_key::hour_label(&hour),
                    device: table.devices.get(idx).cloned().unwrap_or_default(),
                })?;
        }
    }

    let rows: Vec<HourlyRow> = buckets
        .into_iter()
        .map(|(time, counts)| HourlyRow { time, counts })
        .collect();

    tracing::info!(
        "Aggregated {} raw rows into {} hourly buckets",
        table.len(),
        rows.len()
    );

    Ok(HourlyTable {
        devices: table.devices.clone(),
        rows,
    })
}
