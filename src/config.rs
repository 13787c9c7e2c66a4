use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Environment variables that override the input paths directly.
pub const GYM_PATH_ENV: &str = "PATH_GYM_DATA";
pub const WEATHER_PATH_ENV: &str = "PATH_WEATHER_DATA";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub output: OutputConfig,
    pub quality: QualityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub gym_path: PathBuf,
    pub weather_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            gym_path: PathBuf::from("./data/hietaniemi-gym-data.csv"),
            weather_path: PathBuf::from("./data/kaisaniemi-weather-data.csv"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./models/model.json"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub image_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("./images"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct QualityConfig {
    /// Row count the raw dataset is expected to exceed.
    pub min_rows: usize,
    /// First day records are expected on (inclusive).
    pub start_date: NaiveDate,
    /// Last day records are expected on (inclusive).
    pub end_date: NaiveDate,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_rows: 50_000,
            start_date: NaiveDate::from_ymd_opt(2020, 4, 24).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2021, 5, 11).expect("valid date"),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // Load .env file (silently ignore if not present)
        let _ = dotenvy::dotenv();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gym-usage-analysis");

        let data = DataConfig::default();
        let model = ModelConfig::default();
        let output = OutputConfig::default();
        let quality = QualityConfig::default();

        let builder = Config::builder()
            // 1. Load default values
            .set_default("data.gym_path", data.gym_path.to_string_lossy().to_string())?
            .set_default("data.weather_path", data.weather_path.to_string_lossy().to_string())?
            .set_default("model.path", model.path.to_string_lossy().to_string())?
            .set_default("output.image_dir", output.image_dir.to_string_lossy().to_string())?
            .set_default("quality.min_rows", quality.min_rows as u64)?
            .set_default("quality.start_date", quality.start_date.to_string())?
            .set_default("quality.end_date", quality.end_date.to_string())?

            // 2. Load from local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))

            // 3. Load from user config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false))

            // 4. Load from Environment variables (GYM__QUALITY__MIN_ROWS=...)
            .add_source(Environment::with_prefix("GYM").separator("__"))

            // 5. The two plain path variables win over everything else
            .set_override_option("data.gym_path", std::env::var(GYM_PATH_ENV).ok())?
            .set_override_option("data.weather_path", std::env::var(WEATHER_PATH_ENV).ok())?;

        let s = builder.build().context("Failed to build configuration")?;
        s.try_deserialize().context("Invalid configuration")
    }
}
