//! Inference against the pre-trained usage model.
//!
//! The model itself is an external artifact: this module only loads it,
//! shapes the joined dataset into its feature layout, and attaches its
//! predictions back to the rows.

pub mod features;
pub mod inference;
pub mod model;
pub mod persistence;

pub use features::FeatureRow;
pub use inference::{InferenceReport, PredictionRow, infer, select_features};
pub use model::{LinearModel, r_squared};
pub use persistence::{PersistedModel, PersistenceError, load_model};
