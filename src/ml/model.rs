//! Linear regression model wrapper

use super::features::FeatureRow;
use crate::error::PipelineError;
use crate::traits::RegressionModel;

/// A fitted linear model: `y = intercept + coefficients · x`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    /// Create a model from fitted parameters.
    ///
    /// Returns `None` unless there is exactly one coefficient per feature.
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Option<Self> {
        (coefficients.len() == FeatureRow::NUM_FEATURES).then_some(Self {
            coefficients,
            intercept,
        })
    }

    /// Predict usage for a single feature vector
    pub fn predict_one(&self, features: &FeatureRow) -> f64 {
        self.intercept
            + features
                .to_vec()
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Get model information as a string
    pub fn info(&self) -> String {
        let terms: Vec<String> = FeatureRow::feature_names()
            .iter()
            .zip(&self.coefficients)
            .map(|(name, w)| format!("{name}={w:.4}"))
            .collect();
        format!(
            "LinearModel(intercept={:.4}, {})",
            self.intercept,
            terms.join(", ")
        )
    }
}

impl RegressionModel for LinearModel {
    fn predict(&self, features: &[FeatureRow]) -> Result<Vec<f64>, PipelineError> {
        Ok(features.iter().map(|f| self.predict_one(f)).collect())
    }

    fn score(&self, features: &[FeatureRow], targets: &[f64]) -> Result<f64, PipelineError> {
        if features.len() != targets.len() {
            return Err(PipelineError::Model(format!(
                "cannot score {} feature rows against {} targets",
                features.len(),
                targets.len()
            )));
        }
        let predictions = self.predict(features)?;
        Ok(r_squared(targets, &predictions))
    }
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// With constant targets the ratio is undefined: a perfect fit scores 1.0,
/// anything else 0.0. Empty input scores 0.0.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - ss_res / ss_tot
    }
}
