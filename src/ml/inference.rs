//! Runs the model over the joined dataset and attaches its predictions.

use std::fmt;

use super::features::FeatureRow;
use crate::error::PipelineError;
use crate::traits::RegressionModel;
use crate::weather::JoinedRow;

/// Model inputs of one joined hour plus the model's prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRow {
    pub features: FeatureRow,
    pub prediction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InferenceReport {
    pub rows: Vec<PredictionRow>,
    /// `None` when no row survived the null filter and the model was not
    /// called.
    pub score: Option<f64>,
}

impl fmt::Display for InferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>8}{:>6}{:>20}{:>17}{:>20}{:>12}",
            "weekday",
            "hour",
            "Precipitation (mm)",
            "Snow depth (cm)",
            "Temperature (degC)",
            "prediction"
        )?;
        for row in &self.rows {
            let x = row.features;
            writeln!(f)?;
            write!(
                f,
                "{:>8}{:>6}{:>20}{:>17}{:>20}{:>12.3}",
                x.weekday,
                x.hour,
                x.precipitation_mm,
                x.snow_depth_cm,
                x.temperature_degc,
                row.prediction
            )?;
        }
        writeln!(f)?;
        match self.score {
            Some(score) => write!(f, "score: {score}"),
            None => write!(f, "score: n/a (no complete rows)"),
        }
    }
}

/// Feature rows and `sum_minutes` targets for every joined row with all
/// readings present, in joined order.
pub fn select_features(joined: &[JoinedRow]) -> (Vec<FeatureRow>, Vec<f64>) {
    joined
        .iter()
        .filter_map(|row| FeatureRow::from_joined(row).map(|x| (x, row.gym.sum_minutes as f64)))
        .unzip()
}

/// Predict and score with `model`, then zip predictions onto the feature
/// rows. The model must return exactly one prediction per row.
pub fn infer<M: RegressionModel>(
    joined: &[JoinedRow],
    model: &M,
) -> Result<InferenceReport, PipelineError> {
    let (features, targets) = select_features(joined);
    tracing::info!(
        "Running inference on {} of {} joined rows",
        features.len(),
        joined.len()
    );

    if features.is_empty() {
        tracing::warn!("No joined row has a complete feature set, skipping inference");
        return Ok(InferenceReport {
            rows: Vec::new(),
            score: None,
        });
    }

    let predictions = model.predict(&features)?;
    if predictions.len() != features.len() {
        return Err(PipelineError::Model(format!(
            "model returned {} predictions for {} rows",
            predictions.len(),
            features.len()
        )));
    }
    let score = model.score(&features, &targets)?;

    let rows = features
        .into_iter()
        .zip(predictions)
        .map(|(features, prediction)| PredictionRow {
            features,
            prediction,
        })
        .collect();

    Ok(InferenceReport {
        rows,
        score: Some(score),
    })
}
