//! Error types shared by every pipeline stage.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::chart::ChartError;

/// A timestamp, date or hour label that does not match the fixed-width
/// format the datasets use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid timestamp '{0}', expected YYYY-MM-DD HH:MM:SS[+HH:MM]")]
    Timestamp(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    Date(String),
    #[error("invalid hour label '{0}', expected HH:MM")]
    HourLabel(String),
}

/// Structural failures that halt the pipeline.
///
/// Rows without a weather counterpart are not represented here: the join
/// drops them silently.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV unreadable or malformed.
    #[error("failed to load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// Aggregation was asked to run on a table with no rows.
    #[error("cannot aggregate empty dataset")]
    EmptyInput,

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An hourly sum does not fit in an `i64`.
    #[error("usage minutes overflow for device {device} at {hour}")]
    CountOverflow { hour: String, device: String },

    /// The usage table has no counter columns besides `time`.
    #[error("dataset has no device columns besides 'time'")]
    NoDeviceColumns,

    /// The model broke its contract (wrong cardinality, bad input shape).
    #[error("model error: {0}")]
    Model(String),

    #[error(transparent)]
    Chart(#[from] ChartError),
}

impl PipelineError {
    pub fn load(path: &Path, err: impl Display) -> Self {
        PipelineError::Load {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Whether this is a soft, boundary-level failure.
    pub fn is_load_error(&self) -> bool {
        matches!(self, PipelineError::Load { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_message() {
        assert_eq!(
            PipelineError::EmptyInput.to_string(),
            "cannot aggregate empty dataset"
        );
    }

    #[test]
    fn test_load_error_carries_path() {
        let err = PipelineError::load(Path::new("data/gym.csv"), "no such file");
        assert!(err.is_load_error());
        assert_eq!(err.to_string(), "failed to load data/gym.csv: no such file");
    }

    #[test]
    fn test_parse_error_is_transparent() {
        let err: PipelineError = ParseError::HourLabel("7".to_string()).into();
        assert!(!err.is_load_error());
        assert_eq!(err.to_string(), "invalid hour label '7', expected HH:MM");
    }
}
