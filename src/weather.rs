//! Join of the enriched usage with weather observations, and the
//! temperature / precipitation correlations derived from it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::chart::LineChart;
use crate::dataset::{WeatherRow, WeatherTable};
use crate::enrich::{EnrichedHourlyRow, EnrichedTable};
use crate::error::PipelineError;
use crate::time_key::TimeKey;
use crate::traits::ChartRenderer;

pub const TEMPERATURE_CHART_FILE: &str = "usage_gym_temperature.png";
pub const PRECIPITATION_CHART_FILE: &str = "usage_gym_precipitation.png";

/// One hour of gym usage with the weather observed in that hour.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub gym: EnrichedHourlyRow,
    pub weather: WeatherRow,
}

impl JoinedRow {
    pub fn key(&self) -> TimeKey {
        self.gym.key()
    }
}

/// Inner join on (year, month, day, hour).
///
/// Gym rows keep their order. Rows without a weather match are dropped.
/// Duplicate keys are not collapsed: a key present `n` times on one side and
/// `m` times on the other yields `n * m` joined rows.
pub fn join_weather(
    enriched: &EnrichedTable,
    weather: &WeatherTable,
) -> Result<Vec<JoinedRow>, PipelineError> {
    let mut by_key: HashMap<TimeKey, Vec<&WeatherRow>> = HashMap::new();
    for row in &weather.rows {
        by_key.entry(row.key()?).or_default().push(row);
    }

    let mut joined = Vec::new();
    for gym in &enriched.rows {
        if let Some(matches) = by_key.get(&gym.key()) {
            joined.extend(matches.iter().map(|weather| JoinedRow {
                gym: gym.clone(),
                weather: (*weather).clone(),
            }));
        }
    }

    tracing::info!(
        "Joined {} gym hours with {} weather rows into {} rows",
        enriched.len(),
        weather.len(),
        joined.len()
    );
    Ok(joined)
}

/// `(temperature, sum_minutes)` for rows with a temperature, sorted by
/// temperature.
pub fn temperature_series(joined: &[JoinedRow]) -> Vec<(f64, f64)> {
    let mut series: Vec<(f64, f64)> = joined
        .iter()
        .filter_map(|row| {
            row.weather
                .temperature_degc
                .map(|t| (t, row.gym.sum_minutes as f64))
        })
        .collect();
    series.sort_by(|a, b| a.0.total_cmp(&b.0));
    series
}

/// Total usage for one precipitation value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecipitationBucket {
    pub precipitation_mm: f64,
    pub total_minutes: i64,
}

/// Usage summed per distinct precipitation value, ascending. Rows without a
/// precipitation reading are left out.
pub fn precipitation_buckets(joined: &[JoinedRow]) -> Vec<PrecipitationBucket> {
    let mut readings: Vec<(f64, i64)> = joined
        .iter()
        .filter_map(|row| row.weather.precipitation_mm.map(|p| (p, row.gym.sum_minutes)))
        .collect();
    readings.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut buckets: Vec<PrecipitationBucket> = Vec::new();
    for (precipitation_mm, minutes) in readings {
        match buckets.last_mut() {
            Some(last) if last.precipitation_mm == precipitation_mm => {
                last.total_minutes += minutes
            }
            _ => buckets.push(PrecipitationBucket {
                precipitation_mm,
                total_minutes: minutes,
            }),
        }
    }
    buckets
}

/// Reporting artifacts of the weather stage.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherImpact {
    pub joined_rows: usize,
    pub temperature_chart: PathBuf,
    pub precipitation_chart: PathBuf,
    pub precipitation_buckets: Vec<PrecipitationBucket>,
}

impl fmt::Display for WeatherImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} gym hours matched a weather observation.",
            self.joined_rows
        )?;
        writeln!(
            f,
            "Usage against temperature is plotted in {}.",
            self.temperature_chart.display()
        )?;
        writeln!(
            f,
            "Usage against precipitation is plotted in {}.",
            self.precipitation_chart.display()
        )?;
        write!(f, "{:>20}{:>14}", "Precipitation (mm)", "sum_minutes")?;
        for bucket in &self.precipitation_buckets {
            writeln!(f)?;
            write!(f, "{:>20}{:>14}", bucket.precipitation_mm, bucket.total_minutes)?;
        }
        Ok(())
    }
}

/// Render both correlation charts into `image_dir` and build the
/// precipitation table. Nothing here feeds back into the pipeline.
pub fn analyze_weather_impact<R: ChartRenderer>(
    joined: &[JoinedRow],
    renderer: &R,
    image_dir: &Path,
) -> Result<WeatherImpact, PipelineError> {
    let temperature_chart = image_dir.join(TEMPERATURE_CHART_FILE);
    let chart = LineChart::new(
        "Gym usage by temperature",
        "Temperature (degC)",
        "sum_minutes",
        temperature_series(joined),
    );
    renderer.render_line(&chart, &temperature_chart)?;

    let buckets = precipitation_buckets(joined);
    let precipitation_chart = image_dir.join(PRECIPITATION_CHART_FILE);
    let chart = LineChart::new(
        "Gym usage by precipitation",
        "Precipitation (mm)",
        "sum_minutes",
        buckets
            .iter()
            .map(|b| (b.precipitation_mm, b.total_minutes as f64))
            .collect(),
    )
    .with_color((0, 0, 255));
    renderer.render_line(&chart, &precipitation_chart)?;

    Ok(WeatherImpact {
        joined_rows: joined.len(),
        temperature_chart,
        precipitation_chart,
        precipitation_buckets: buckets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::HourlyRow;
    use crate::error::ParseError;
    use crate::time_key::parse_timestamp;
    use crate::traits::MockChartRenderer;

    fn gym(time: &str, counts: Vec<i64>) -> EnrichedHourlyRow {
        EnrichedHourlyRow::from_hourly(HourlyRow {
            time: parse_timestamp(time).unwrap(),
            counts,
        })
    }

    fn weather(day: u32, hour: &str, temperature: Option<f64>, precipitation: Option<f64>) -> WeatherRow {
        WeatherRow {
            year: 2020,
            month: 4,
            day,
            hour_label: hour.to_string(),
            temperature_degc: temperature,
            precipitation_mm: precipitation,
            snow_depth_cm: Some(0.0),
        }
    }

    fn enriched(rows: Vec<EnrichedHourlyRow>) -> EnrichedTable {
        EnrichedTable {
            devices: vec!["19".to_string(), "20".to_string()],
            rows,
        }
    }

    // ==================== Join Tests ====================

    #[test]
    fn test_join_matches_on_full_key() {
        let left = enriched(vec![
            gym("2020-04-24 00:00:00", vec![1, 1]),
            gym("2020-04-24 01:00:00", vec![2, 2]),
            gym("2020-04-25 01:00:00", vec![3, 3]),
        ]);
        let right = WeatherTable::new(vec![
            weather(24, "01:00", Some(5.0), Some(0.0)),
            weather(25, "00:00", Some(6.0), Some(0.0)),
        ]);

        let joined = join_weather(&left, &right).unwrap();

        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].key(), TimeKey::new(2020, 4, 24, 1));
        assert_eq!(joined[0].gym.sum_minutes, 4);
        assert_eq!(joined[0].weather.temperature_degc, Some(5.0));
    }

    #[test]
    fn test_join_keeps_cross_product_of_duplicate_keys() {
        let left = enriched(vec![
            gym("2020-04-24 00:00:00", vec![1, 0]),
            gym("2020-04-24 00:00:00", vec![0, 1]),
        ]);
        let right = WeatherTable::new(vec![
            weather(24, "00:00", Some(1.0), None),
            weather(24, "00:00", Some(2.0), None),
            weather(24, "00:30", Some(3.0), None),
        ]);

        let joined = join_weather(&left, &right).unwrap();
        assert_eq!(joined.len(), 6);
    }

    #[test]
    fn test_join_without_overlap_is_empty_not_error() {
        let left = enriched(vec![gym("2020-04-24 00:00:00", vec![1, 1])]);
        let right = WeatherTable::new(vec![weather(30, "00:00", None, None)]);

        assert!(join_weather(&left, &right).unwrap().is_empty());
    }

    #[test]
    fn test_join_fails_on_malformed_hour_label() {
        let left = enriched(vec![gym("2020-04-24 00:00:00", vec![1, 1])]);
        let right = WeatherTable::new(vec![weather(24, "0", None, None)]);

        assert!(matches!(
            join_weather(&left, &right),
            Err(PipelineError::Parse(ParseError::HourLabel(_)))
        ));
    }

    // ==================== Correlation Tests ====================

    fn joined_fixture() -> Vec<JoinedRow> {
        let left = enriched(vec![
            gym("2020-04-24 00:00:00", vec![5, 5]),
            gym("2020-04-24 01:00:00", vec![1, 1]),
            gym("2020-04-24 02:00:00", vec![3, 0]),
            gym("2020-04-24 03:00:00", vec![7, 0]),
        ]);
        let right = WeatherTable::new(vec![
            weather(24, "00:00", Some(12.0), Some(0.0)),
            weather(24, "01:00", Some(-2.0), Some(1.5)),
            weather(24, "02:00", None, Some(0.0)),
            weather(24, "03:00", Some(4.0), None),
        ]);
        join_weather(&left, &right).unwrap()
    }

    #[test]
    fn test_temperature_series_sorted_and_skips_missing() {
        let series = temperature_series(&joined_fixture());
        assert_eq!(series, vec![(-2.0, 2.0), (4.0, 7.0), (12.0, 10.0)]);
    }

    #[test]
    fn test_precipitation_buckets_group_and_sort() {
        let buckets = precipitation_buckets(&joined_fixture());
        assert_eq!(
            buckets,
            vec![
                PrecipitationBucket {
                    precipitation_mm: 0.0,
                    total_minutes: 13
                },
                PrecipitationBucket {
                    precipitation_mm: 1.5,
                    total_minutes: 2
                },
            ]
        );
    }

    #[test]
    fn test_nan_readings_from_csv_stay_out_of_buckets_and_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.csv");
        std::fs::write(
            &path,
            "Year,Month,Day,Hour,Precipitation (mm),Snow depth (cm),Temperature (degC)\n\
             2020,4,24,00:00,NaN,0,NaN\n\
             2020,4,24,01:00,NaN,0,NaN\n\
             2020,4,24,02:00,0.5,0,3.0\n",
        )
        .unwrap();
        let right = crate::dataset::load_weather(&path).unwrap();
        let left = enriched(vec![
            gym("2020-04-24 00:00:00", vec![5, 5]),
            gym("2020-04-24 01:00:00", vec![5, 5]),
            gym("2020-04-24 02:00:00", vec![5, 5]),
        ]);

        let joined = join_weather(&left, &right).unwrap();
        assert_eq!(joined.len(), 3);

        assert_eq!(
            precipitation_buckets(&joined),
            vec![PrecipitationBucket {
                precipitation_mm: 0.5,
                total_minutes: 10
            }]
        );
        assert_eq!(temperature_series(&joined), vec![(3.0, 10.0)]);
    }

    #[test]
    fn test_analyze_weather_impact_renders_two_charts() {
        let renderer = MockChartRenderer::new();
        let impact =
            analyze_weather_impact(&joined_fixture(), &renderer, Path::new("images")).unwrap();

        assert_eq!(impact.joined_rows, 4);
        assert_eq!(impact.temperature_chart, Path::new("images").join(TEMPERATURE_CHART_FILE));

        let rendered = renderer.rendered();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].0.x_label, "Temperature (degC)");
        assert_eq!(rendered[1].0.points, vec![(0.0, 13.0), (1.5, 2.0)]);
        assert_eq!(rendered[1].1, impact.precipitation_chart);

        let text = impact.to_string();
        assert!(text.contains("Precipitation (mm)"));
        assert!(text.contains("1.5"));
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn joined_keys_exist_on_both_sides(
                gym_hours in prop::collection::vec(0u32..48, 1..40),
                weather_hours in prop::collection::vec(0u32..48, 0..40)
            ) {
                let left = enriched(
                    gym_hours
                        .iter()
                        .map(|h| gym(&format!("2020-04-{:02} {:02}:00:00", 24 + h / 24, h % 24), vec![1, 1]))
                        .collect(),
                );
                let right = WeatherTable::new(
                    weather_hours
                        .iter()
                        .map(|h| weather(24 + h / 24, &format!("{:02}:00", h % 24), Some(1.0), Some(0.0)))
                        .collect(),
                );

                let joined = join_weather(&left, &right).unwrap();

                for row in &joined {
                    let key = row.key();
                    prop_assert_eq!(row.weather.key().unwrap(), key);
                    prop_assert_eq!(TimeKey::from_datetime(&row.gym.hourly.time), key);
                }
                let expected: usize = gym_hours
                    .iter()
                    .map(|g| weather_hours.iter().filter(|w| *w == g).count())
                    .sum();
                prop_assert_eq!(joined.len(), expected);
            }
        }
    }
}
