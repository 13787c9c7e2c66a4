//! Model input layout.

use crate::weather::JoinedRow;

/// Features of one joined hour, in the order the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub weekday: f64,
    pub hour: f64,
    pub precipitation_mm: f64,
    pub snow_depth_cm: f64,
    pub temperature_degc: f64,
}

impl FeatureRow {
    /// Number of features
    pub const NUM_FEATURES: usize = 5;

    /// Convert features to a vector for the model
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.weekday,
            self.hour,
            self.precipitation_mm,
            self.snow_depth_cm,
            self.temperature_degc,
        ]
    }

    /// Column names, in `to_vec` order.
    pub fn feature_names() -> Vec<&'static str> {
        vec![
            "weekday",
            "hour",
            "Precipitation (mm)",
            "Snow depth (cm)",
            "Temperature (degC)",
        ]
    }

    /// Features of a joined row, or `None` when any weather reading is
    /// missing.
    pub fn from_joined(row: &JoinedRow) -> Option<Self> {
        Some(Self {
            weekday: f64::from(row.gym.weekday),
            hour: f64::from(row.gym.hour),
            precipitation_mm: row.weather.precipitation_mm?,
            snow_depth_cm: row.weather.snow_depth_cm?,
            temperature_degc: row.weather.temperature_degc?,
        })
    }
}
