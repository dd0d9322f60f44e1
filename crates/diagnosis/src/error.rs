//! Diagnosis Error Types

use crate::config::ConfigError;
use feature_engine::AnalysisError;
use inference_engine::InferenceError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use waveform::{SignalError, SourceError};

/// Any failure of a diagnosis, carried unchanged from the component that raised it
#[derive(Debug, Error)]
pub enum DiagnosisError {
    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure category, stable across component error types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidSignal,
    InvalidScales,
    IncompleteFeatureSet,
    SchemaMismatch,
    ModelUnavailable,
    InvalidModel,
    /// Waveform file could not be read
    SourceUnavailable,
    Configuration,
}

impl ErrorKind {
    /// Stable upper-case name, as used in metrics labels and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidSignal => "INVALID_SIGNAL",
            ErrorKind::InvalidScales => "INVALID_SCALES",
            ErrorKind::IncompleteFeatureSet => "INCOMPLETE_FEATURE_SET",
            ErrorKind::SchemaMismatch => "SCHEMA_MISMATCH",
            ErrorKind::ModelUnavailable => "MODEL_UNAVAILABLE",
            ErrorKind::InvalidModel => "INVALID_MODEL",
            ErrorKind::SourceUnavailable => "SOURCE_UNAVAILABLE",
            ErrorKind::Configuration => "CONFIGURATION",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DiagnosisError {
    /// Category of this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiagnosisError::Signal(_) => ErrorKind::InvalidSignal,
            DiagnosisError::Source(source) => match source {
                SourceError::Io { .. } => ErrorKind::SourceUnavailable,
                SourceError::Csv(_)
                | SourceError::Parse { .. }
                | SourceError::MissingField(_)
                | SourceError::Signal(_) => ErrorKind::InvalidSignal,
                SourceError::InvalidParameter(_) => ErrorKind::Configuration,
            },
            DiagnosisError::Analysis(analysis) => match analysis {
                AnalysisError::InvalidSignal(_) => ErrorKind::InvalidSignal,
                AnalysisError::InvalidScales(_) => ErrorKind::InvalidScales,
                AnalysisError::IncompleteFeatureSet { .. } => ErrorKind::IncompleteFeatureSet,
                AnalysisError::InvalidKernel(_) | AnalysisError::InvalidBand(_) => {
                    ErrorKind::Configuration
                }
            },
            DiagnosisError::Inference(inference) => match inference {
                InferenceError::SchemaMismatch { .. }
                | InferenceError::InvalidInputShape { .. } => ErrorKind::SchemaMismatch,
                InferenceError::ModelUnavailable => ErrorKind::ModelUnavailable,
                InferenceError::InvalidModel(_) | InferenceError::ModelLoadError(_) => {
                    ErrorKind::InvalidModel
                }
                InferenceError::MissingFeatures(_) => ErrorKind::IncompleteFeatureSet,
            },
            DiagnosisError::Config(_) => ErrorKind::Configuration,
        }
    }
}
