//! Sequential analysis pipeline.
//!
//! Raw usage → quality checks → hourly aggregate → popularity → enrichment
//! → weather join → inference. Every stage blocks on the full output of the
//! previous one; the quality and popularity stages only report.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::aggregate::{self, HourlyTable};
use crate::analytics::{self, PopularityReport};
use crate::config::AppConfig;
use crate::dataset::{UsageTable, WeatherTable};
use crate::enrich::{self, EnrichedTable};
use crate::error::PipelineError;
use crate::ml::{self, InferenceReport};
use crate::quality::{self, QualityReport};
use crate::traits::{ChartRenderer, RegressionModel};
use crate::weather::{self, WeatherImpact};

/// Rows shown for the hourly and enriched tables in the report.
pub const PREVIEW_ROWS: usize = 10;

/// Settings the stages need, resolved from [`AppConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub min_rows: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub image_dir: PathBuf,
}

impl AnalysisSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            min_rows: config.quality.min_rows,
            start_date: config.quality.start_date,
            end_date: config.quality.end_date,
            image_dir: config.output.image_dir.clone(),
        }
    }
}

/// Findings of every stage, in task order.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub hourly: HourlyTable,
    pub quality: QualityReport,
    pub popularity: PopularityReport,
    pub enriched: EnrichedTable,
    pub weather: WeatherImpact,
    pub inference: InferenceReport,
}

fn banner(f: &mut fmt::Formatter<'_>, task: u8, title: &str) -> fmt::Result {
    writeln!(f, "{:=^80}", format!(" TASK {task}: {title} "))
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, 1, "HOURLY AGGREGATE")?;
        let preview = HourlyTable {
            devices: self.hourly.devices.clone(),
            rows: self.hourly.rows.iter().take(PREVIEW_ROWS).cloned().collect(),
        };
        writeln!(f, "First {} of {} hourly rows:", preview.len(), self.hourly.len())?;
        writeln!(f, "{preview}\n")?;

        banner(f, 2, "QUALITY CHECKS")?;
        writeln!(f, "{}", self.quality.row_count)?;
        writeln!(f, "{}", self.quality.date_range)?;
        writeln!(f, "{}\n", self.quality.positivity)?;

        banner(f, 3, "POPULARITY")?;
        writeln!(f, "{}", self.popularity.most_popular)?;
        writeln!(f, "Total device usage by hour of day:")?;
        for (hour, minutes) in &self.popularity.hour_distribution {
            writeln!(f, "{hour:02}  {minutes}")?;
        }
        writeln!(f, "{}\n", self.popularity.weekend)?;

        banner(f, 4, "NEW FEATURES")?;
        let preview = EnrichedTable {
            devices: self.enriched.devices.clone(),
            rows: self.enriched.rows.iter().take(PREVIEW_ROWS).cloned().collect(),
        };
        writeln!(f, "{preview}\n")?;

        banner(f, 5, "WEATHER IMPACT")?;
        writeln!(f, "{}\n", self.weather)?;

        banner(f, 6, "INFERENCE")?;
        write!(f, "{}", self.inference)
    }
}

/// The analysis with its collaborators injected.
pub struct GymAnalysis<M, R> {
    settings: AnalysisSettings,
    model: M,
    renderer: R,
}

impl<M: RegressionModel, R: ChartRenderer> GymAnalysis<M, R> {
    pub fn new(settings: AnalysisSettings, model: M, renderer: R) -> Self {
        Self {
            settings,
            model,
            renderer,
        }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Run every stage. Quality findings never halt the run; empty input,
    /// malformed timestamps and model contract violations do.
    pub fn run(
        &self,
        usage: &UsageTable,
        weather: &WeatherTable,
    ) -> Result<AnalysisReport, PipelineError> {
        tracing::info!("Running quality checks on {} raw rows", usage.len());
        let quality = quality::run_quality_checks(
            usage,
            self.settings.min_rows,
            self.settings.start_date,
            self.settings.end_date,
        );

        let hourly = aggregate::aggregate_hourly(usage)?;

        tracing::info!("Analysing device popularity");
        let popularity = analytics::analyze_popularity(&hourly)?;

        let enriched = enrich::enrich(hourly.clone());

        let joined = weather::join_weather(&enriched, weather)?;
        let weather_impact =
            weather::analyze_weather_impact(&joined, &self.renderer, &self.settings.image_dir)?;

        let inference = ml::infer(&joined, &self.model)?;
        tracing::info!(
            "Pipeline finished: {} predictions, score {:?}",
            inference.rows.len(),
            inference.score
        );

        Ok(AnalysisReport {
            hourly,
            quality,
            popularity,
            enriched,
            weather: weather_impact,
            inference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{RawUsageRow, WeatherRow};
    use crate::time_key::parse_timestamp;
    use crate::traits::{MockChartRenderer, MockModel};

    fn settings() -> AnalysisSettings {
        AnalysisSettings {
            min_rows: 2,
            start_date: NaiveDate::from_ymd_opt(2022, 8, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2022, 8, 7).unwrap(),
            image_dir: PathBuf::from("images"),
        }
    }

    fn usage() -> UsageTable {
        let rows = [
            ("2022-08-06 10:00:00+00:00", vec![5, 1]),
            ("2022-08-06 10:30:00+00:00", vec![5, 1]),
            ("2022-08-06 11:00:00+00:00", vec![2, 2]),
            ("2022-08-08 09:00:00+00:00", vec![1, 0]),
        ];
        UsageTable::new(
            vec!["19".to_string(), "20".to_string()],
            rows.into_iter()
                .map(|(t, counts)| RawUsageRow {
                    time: parse_timestamp(t).unwrap(),
                    counts,
                })
                .collect(),
        )
    }

    fn weather() -> WeatherTable {
        let row = |day: u32, hour: &str, temperature: Option<f64>| WeatherRow {
            year: 2022,
            month: 8,
            day,
            hour_label: hour.to_string(),
            temperature_degc: temperature,
            precipitation_mm: Some(0.0),
            snow_depth_cm: Some(0.0),
        };
        WeatherTable::new(vec![
            row(6, "10:00", Some(21.0)),
            row(6, "11:00", None),
            row(8, "09:00", Some(15.0)),
        ])
    }

    #[test]
    fn test_run_produces_every_stage() {
        let renderer = MockChartRenderer::new();
        let model = MockModel::new(7.0, 0.13);
        let analysis = GymAnalysis::new(settings(), &model, renderer.clone());

        let report = analysis.run(&usage(), &weather()).unwrap();

        assert_eq!(report.quality.row_count.count, 4);
        assert!(report.quality.row_count.above_threshold());
        assert_eq!(report.quality.date_range.count, 3);
        assert_eq!(report.quality.positivity.non_positive, 1);

        assert_eq!(report.hourly.len(), 3);
        assert_eq!(report.hourly.rows[0].counts, vec![10, 2]);

        assert_eq!(report.popularity.most_popular.device, "19");
        assert_eq!(report.popularity.weekend.weekend_minutes, 16);
        assert_eq!(report.popularity.weekend.weekday_minutes, 1);

        assert_eq!(report.enriched.rows[0].sum_minutes, 12);
        assert_eq!(report.weather.joined_rows, 3);
        assert_eq!(renderer.render_count(), 2);

        // The 11:00 hour has no temperature and is filtered out.
        assert_eq!(report.inference.rows.len(), 2);
        assert_eq!(report.inference.score, Some(0.13));
        assert_eq!(model.predict_calls(), vec![2]);
    }

    #[test]
    fn test_run_on_empty_usage_halts() {
        let analysis = GymAnalysis::new(
            settings(),
            MockModel::new(0.0, 0.0),
            MockChartRenderer::new(),
        );

        let err = analysis
            .run(&UsageTable::default(), &weather())
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput));
    }

    #[test]
    fn test_report_display_has_all_tasks() {
        let analysis = GymAnalysis::new(
            settings(),
            MockModel::new(1.0, 0.5),
            MockChartRenderer::new(),
        );
        let text = analysis.run(&usage(), &weather()).unwrap().to_string();

        for task in 1..=6 {
            assert!(text.contains(&format!("TASK {task}:")), "missing task {task}");
        }
        assert!(text.contains("The most popular device is 19"));
        assert!(text.contains("score: 0.5"));
    }

    #[test]
    fn test_settings_from_config() {
        let config = AppConfig {
            data: Default::default(),
            model: Default::default(),
            output: Default::default(),
            quality: Default::default(),
        };
        let settings = AnalysisSettings::from_config(&config);

        assert_eq!(settings.min_rows, 50_000);
        assert_eq!(settings.image_dir, PathBuf::from("./images"));
        assert_eq!(settings.start_date, NaiveDate::from_ymd_opt(2020, 4, 24).unwrap());
    }
}
