//! Abstractions for the pipeline's external collaborators.
//!
//! This module provides traits for:
//! - `RegressionModel`: the pre-trained model, consumed through `predict`/`score`
//! - `ChartRenderer`: writing line charts to image files
//!
//! Both are injected into the pipeline so tests can swap in the mocks below.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::chart::{ChartError, LineChart};
use crate::error::PipelineError;
use crate::ml::FeatureRow;

// ==================== Model Trait ====================

/// Trait for an opaque, already trained regression model.
///
/// Contract: `predict` returns exactly one value per input row, in input
/// order; `score` returns a goodness-of-fit scalar for the given targets.
pub trait RegressionModel {
    fn predict(&self, features: &[FeatureRow]) -> Result<Vec<f64>, PipelineError>;

    fn score(&self, features: &[FeatureRow], targets: &[f64]) -> Result<f64, PipelineError>;
}

impl<M: RegressionModel + ?Sized> RegressionModel for &M {
    fn predict(&self, features: &[FeatureRow]) -> Result<Vec<f64>, PipelineError> {
        (**self).predict(features)
    }

    fn score(&self, features: &[FeatureRow], targets: &[f64]) -> Result<f64, PipelineError> {
        (**self).score(features, targets)
    }
}

/// Mock model for testing with canned outputs.
///
/// Predictions are `fill` for every row unless an explicit list is set, in
/// which case that list is returned as-is (useful to provoke cardinality
/// mismatches).
#[derive(Debug, Clone)]
pub struct MockModel {
    fill: f64,
    predictions: Option<Vec<f64>>,
    score: f64,
    calls: Arc<Mutex<Vec<usize>>>,
}

impl MockModel {
    /// Create a mock predicting `fill` for every row.
    pub fn new(fill: f64, score: f64) -> Self {
        Self {
            fill,
            predictions: None,
            score,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Return exactly these predictions regardless of input size.
    pub fn with_predictions(mut self, predictions: Vec<f64>) -> Self {
        self.predictions = Some(predictions);
        self
    }

    /// Row counts passed to `predict`, one entry per call.
    pub fn predict_calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

impl RegressionModel for MockModel {
    fn predict(&self, features: &[FeatureRow]) -> Result<Vec<f64>, PipelineError> {
        self.calls.lock().unwrap().push(features.len());
        Ok(self
            .predictions
            .clone()
            .unwrap_or_else(|| vec![self.fill; features.len()]))
    }

    fn score(&self, _features: &[FeatureRow], _targets: &[f64]) -> Result<f64, PipelineError> {
        Ok(self.score)
    }
}

// ==================== Chart Renderer Trait ====================

/// Trait for rendering a line chart to a file.
pub trait ChartRenderer {
    fn render_line(&self, chart: &LineChart, path: &Path) -> Result<(), ChartError>;
}

/// Mock renderer that records every chart instead of drawing it.
#[derive(Debug, Clone, Default)]
pub struct MockChartRenderer {
    rendered: Arc<Mutex<Vec<(LineChart, PathBuf)>>>,
}

impl MockChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All charts rendered so far with their target paths.
    pub fn rendered(&self) -> Vec<(LineChart, PathBuf)> {
        self.rendered.lock().unwrap().clone()
    }

    pub fn render_count(&self) -> usize {
        self.rendered.lock().unwrap().len()
    }
}

impl ChartRenderer for MockChartRenderer {
    fn render_line(&self, chart: &LineChart, path: &Path) -> Result<(), ChartError> {
        self.rendered
            .lock()
            .unwrap()
            .push((chart.clone(), path.to_path_buf()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(hour: f64) -> FeatureRow {
        FeatureRow {
            weekday: 0.0,
            hour,
            precipitation_mm: 0.0,
            snow_depth_cm: 0.0,
            temperature_degc: 10.0,
        }
    }

    #[test]
    fn test_mock_model_fills_one_prediction_per_row() {
        let model = MockModel::new(2.5, 0.13);
        let predictions = model.predict(&[feature(1.0), feature(2.0)]).unwrap();

        assert_eq!(predictions, vec![2.5, 2.5]);
        assert_eq!(model.score(&[], &[]).unwrap(), 0.13);
        assert_eq!(model.predict_calls(), vec![2]);
    }

    #[test]
    fn test_mock_model_explicit_predictions() {
        let model = MockModel::new(0.0, 0.0).with_predictions(vec![1.0]);
        let predictions = model.predict(&[feature(1.0), feature(2.0)]).unwrap();
        assert_eq!(predictions, vec![1.0]);
    }

    #[test]
    fn test_model_reference_delegates() {
        let model = MockModel::new(1.0, 0.5);
        let by_ref = &model;
        assert_eq!(by_ref.predict(&[feature(3.0)]).unwrap(), vec![1.0]);
        assert_eq!(model.predict_calls().len(), 1);
    }

    #[test]
    fn test_mock_renderer_records_charts() {
        let renderer = MockChartRenderer::new();
        let chart = LineChart::new("title", "x", "y", vec![(1.0, 2.0)]);

        renderer.render_line(&chart, Path::new("images/a.png")).unwrap();

        assert_eq!(renderer.render_count(), 1);
        let rendered = renderer.rendered();
        assert_eq!(rendered[0].0, chart);
        assert_eq!(rendered[0].1, PathBuf::from("images/a.png"));
    }
}
