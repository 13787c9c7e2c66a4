//! CSV loading for the gym usage counters and the weather observations.
//!
//! Device columns are resolved from the usage header: every column except
//! `time` is a counter. Unreadable or structurally broken files surface as
//! [`PipelineError::Load`]; timestamps that do not match the fixed-width
//! format surface as [`PipelineError::Parse`] and always halt.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::{ParseError, PipelineError};
use crate::time_key::{self, TimeKey};

/// Name of the timestamp column in the usage CSV.
pub const TIME_COLUMN: &str = "time";

/// One sampling interval of the usage dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUsageRow {
    pub time: NaiveDateTime,
    /// Usage minutes, one entry per device column in table order.
    pub counts: Vec<i64>,
}

/// Raw usage dataset as loaded from CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageTable {
    pub devices: Vec<String>,
    pub rows: Vec<RawUsageRow>,
}

impl UsageTable {
    pub fn new(devices: Vec<String>, rows: Vec<RawUsageRow>) -> Self {
        Self { devices, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One hourly weather observation.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRow {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Raw `Hour` cell, e.g. `07:00`. Parsed when the join key is derived.
    pub hour_label: String,
    pub temperature_degc: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub snow_depth_cm: Option<f64>,
}

impl WeatherRow {
    pub fn key(&self) -> Result<TimeKey, ParseError> {
        let hour = time_key::parse_hour_label(&self.hour_label)?;
        Ok(TimeKey::new(self.year, self.month, self.day, hour))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherTable {
    pub rows: Vec<WeatherRow>,
}

impl WeatherTable {
    pub fn new(rows: Vec<WeatherRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Header-mapped weather record. Measurement cells that are empty or not a
/// number become `None`.
#[derive(Debug, Deserialize)]
struct WeatherRecord {
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Month")]
    month: u32,
    #[serde(rename = "Day")]
    day: u32,
    #[serde(rename = "Hour")]
    hour: String,
    #[serde(rename = "Temperature (degC)", default, deserialize_with = "csv::invalid_option")]
    temperature_degc: Option<f64>,
    #[serde(rename = "Precipitation (mm)", default, deserialize_with = "csv::invalid_option")]
    precipitation_mm: Option<f64>,
    #[serde(rename = "Snow depth (cm)", default, deserialize_with = "csv::invalid_option")]
    snow_depth_cm: Option<f64>,
}

/// `NaN` cells parse as a float; they are missing readings all the same.
fn reading(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

impl From<WeatherRecord> for WeatherRow {
    fn from(record: WeatherRecord) -> Self {
        Self {
            year: record.year,
            month: record.month,
            day: record.day,
            hour_label: record.hour,
            temperature_degc: reading(record.temperature_degc),
            precipitation_mm: reading(record.precipitation_mm),
            snow_depth_cm: reading(record.snow_depth_cm),
        }
    }
}

/// Empty cells count as zero minutes.
fn parse_count(cell: &str, device: &str, line: usize) -> Result<i64, String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<i64>()
        .map_err(|e| format!("invalid count '{trimmed}' for device {device} on row {line}: {e}"))
}

/// Load the usage dataset.
pub fn load_usage(path: &Path) -> Result<UsageTable, PipelineError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| PipelineError::load(path, e))?;
    let headers = reader
        .headers()
        .map_err(|e| PipelineError::load(path, e))?
        .clone();

    let time_idx = headers
        .iter()
        .position(|h| h.trim() == TIME_COLUMN)
        .ok_or_else(|| PipelineError::load(path, format!("missing column '{TIME_COLUMN}'")))?;

    let device_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != time_idx)
        .map(|(idx, name)| (idx, name.trim().to_string()))
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| PipelineError::load(path, e))?;
        let time = time_key::parse_timestamp(record.get(time_idx).unwrap_or_default())?;

        let counts = device_columns
            .iter()
            .map(|(idx, device)| parse_count(record.get(*idx).unwrap_or_default(), device, line + 1))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PipelineError::load(path, e))?;

        rows.push(RawUsageRow { time, counts });
    }

    let devices = device_columns.into_iter().map(|(_, name)| name).collect();
    tracing::debug!("Loaded {} usage rows from {}", rows.len(), path.display());
    Ok(UsageTable::new(devices, rows))
}

/// Load the weather dataset.
pub fn load_weather(path: &Path) -> Result<WeatherTable, PipelineError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| PipelineError::load(path, e))?;

    let rows = reader
        .deserialize::<WeatherRecord>()
        .map(|record| record.map(WeatherRow::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PipelineError::load(path, e))?;

    tracing::debug!("Loaded {} weather rows from {}", rows.len(), path.display());
    Ok(WeatherTable::new(rows))
}

/// Load the usage dataset, substituting an empty table when the file cannot
/// be read. Parse errors still propagate.
pub fn load_usage_or_empty(path: &Path) -> Result<UsageTable, PipelineError> {
    match load_usage(path) {
        Err(err) if err.is_load_error() => {
            tracing::error!("Error reading csv file: {}", err);
            Ok(UsageTable::default())
        }
        other => other,
    }
}

/// Weather counterpart of [`load_usage_or_empty`].
pub fn load_weather_or_empty(path: &Path) -> Result<WeatherTable, PipelineError> {
    match load_weather(path) {
        Err(err) if err.is_load_error() => {
            tracing::error!("Error reading csv file: {}", err);
            Ok(WeatherTable::default())
        }
        other => other,
    }
}
