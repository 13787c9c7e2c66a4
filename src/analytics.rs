//! Popularity analysis over the hourly aggregate.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Timelike;

use crate::aggregate::HourlyTable;
use crate::error::PipelineError;
use crate::time_key;

// ==================== Result Types ====================

/// The device with the most usage minutes over the whole tracking period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUsage {
    pub device: String,
    pub total_minutes: i64,
}

impl fmt::Display for DeviceUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The most popular device is {}, used in total {} minutes.",
            self.device, self.total_minutes
        )
    }
}

/// Total usage on weekends (Saturday, Sunday) against weekdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekendComparison {
    pub weekend_minutes: i64,
    pub weekday_minutes: i64,
}

impl WeekendComparison {
    /// Strictly greater; a tie is "not more popular".
    pub fn weekend_more_popular(&self) -> bool {
        self.weekend_minutes > self.weekday_minutes
    }
}

impl fmt::Display for WeekendComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weekend_more_popular() {
            write!(
                f,
                "Yes, the gym was more popular overall on weekends than on weekdays: "
            )?;
        } else {
            write!(
                f,
                "No, the gym was not more popular overall on weekends than on weekdays: "
            )?;
        }
        write!(
            f,
            "usage weekends = {} minutes, usage weekdays = {} minutes.",
            self.weekend_minutes, self.weekday_minutes
        )
    }
}

/// Everything the popularity stage reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopularityReport {
    pub most_popular: DeviceUsage,
    /// Total minutes per hour of day (0-23).
    pub hour_distribution: BTreeMap<u32, i64>,
    pub weekend: WeekendComparison,
}

// ==================== Analysis Functions ====================

/// Sum of every device column, in column order.
pub fn device_totals(table: &HourlyTable) -> Vec<i64> {
    (0..table.devices.len())
        .map(|idx| table.device_total(idx))
        .collect()
}

/// Device with the strictly greatest total; on a tie the first column wins.
pub fn most_popular_device(table: &HourlyTable) -> Result<DeviceUsage, PipelineError> {
    let totals = device_totals(table);
    let mut best: Option<(usize, i64)> = None;

    for (idx, &total) in totals.iter().enumerate() {
        match best {
            Some((_, best_total)) if total <= best_total => {}
            _ => best = Some((idx, total)),
        }
    }

    let (idx, total_minutes) = best.ok_or(PipelineError::NoDeviceColumns)?;
    Ok(DeviceUsage {
        device: table.devices[idx].clone(),
        total_minutes,
    })
}

/// Total minutes across all devices grouped by hour of day.
///
/// Rows are already hour-truncated, so the grouping key is the hour of day
/// alone and the same hour on different dates lands in one bucket.
pub fn hour_of_day_distribution(table: &HourlyTable) -> BTreeMap<u32, i64> {
    let mut distribution = BTreeMap::new();
    for row in &table.rows {
        *distribution.entry(row.time.hour()).or_insert(0) += row.total();
    }
    distribution
}

pub fn weekend_vs_weekday(table: &HourlyTable) -> WeekendComparison {
    table
        .rows
        .iter()
        .fold(WeekendComparison::default(), |mut acc, row| {
            if time_key::is_weekend(time_key::weekday_index(&row.time)) {
                acc.weekend_minutes += row.total();
            } else {
                acc.weekday_minutes += row.total();
            }
            acc
        })
}

pub fn analyze_popularity(table: &HourlyTable) -> Result<PopularityReport, PipelineError> {
    let most_popular = most_popular_device(table)?;
    let hour_distribution = hour_of_day_distribution(table);
    let weekend = weekend_vs_weekday(table);

    tracing::debug!(
        device = %most_popular.device,
        weekend = weekend.weekend_minutes,
        weekday = weekend.weekday_minutes,
        "Popularity analysis finished"
    );

    Ok(PopularityReport {
        most_popular,
        hour_distribution,
        weekend,
    })
}
