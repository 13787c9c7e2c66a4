//! Gym Usage Analysis Library
//!
//! This module exposes the pipeline stages of the outdoor gym usage analysis
//! for testing and reuse by the binary.

pub mod aggregate;
pub mod analytics;
pub mod chart;
pub mod config;
pub mod dataset;
pub mod enrich;
pub mod error;
pub mod ml;
pub mod pipeline;
pub mod quality;
pub mod time_key;
pub mod traits;
pub mod weather;

// Re-export commonly used types
pub use aggregate::{HourlyRow, HourlyTable, aggregate_hourly};
pub use analytics::{
    DeviceUsage, PopularityReport, WeekendComparison, analyze_popularity, hour_of_day_distribution,
    most_popular_device, weekend_vs_weekday,
};
pub use chart::{ChartError, LineChart, PlottersRenderer};
pub use config::AppConfig;
pub use dataset::{
    RawUsageRow, UsageTable, WeatherRow, WeatherTable, load_usage, load_usage_or_empty,
    load_weather, load_weather_or_empty,
};
pub use enrich::{EnrichedHourlyRow, EnrichedTable, enrich};
pub use error::{ParseError, PipelineError};
pub use ml::{FeatureRow, InferenceReport, LinearModel, PersistedModel, PredictionRow, infer};
pub use pipeline::{AnalysisReport, AnalysisSettings, GymAnalysis};
pub use quality::{
    DateRangeCheck, PositivityCheck, QualityReport, RowCountCheck, check_all_positive,
    check_date_range, check_row_count,
};
pub use time_key::TimeKey;
pub use traits::{ChartRenderer, MockChartRenderer, MockModel, RegressionModel};
pub use weather::{JoinedRow, PrecipitationBucket, WeatherImpact, join_weather};
