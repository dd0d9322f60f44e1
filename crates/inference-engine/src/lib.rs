//! Fault Inference Engine
//!
//! The [`FaultClassifier`] capability plus the trained-model variant: a
//! [`FaultModel`] artifact (schema, normaliser, decision function) published
//! through a hot-swappable [`ModelHandle`].

mod classifier;
mod engine;
mod model;
mod normalizer;

pub use classifier::{ClassifierInput, Decision, FaultClassifier, Verdict};
pub use engine::{ModelClassifier, ModelHandle, ModelSnapshot};
pub use model::{ClassLabels, DecisionFunction, FaultModel};
pub use normalizer::Normalizer;

use thiserror::Error;

/// Errors during classification or model loading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("Schema mismatch: model expects '{expected}', feature vector built under '{actual}'")]
    SchemaMismatch { expected: String, actual: String },
    #[error("No fault model is loaded")]
    ModelUnavailable,
    #[error("Invalid fault model: {0}")]
    InvalidModel(String),
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Classifier '{0}' requires a feature vector")]
    MissingFeatures(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
}
