//! Analysis Error Types

use thiserror::Error;
use waveform::SignalError;

/// Errors raised by the analyzers and the feature extractor
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Malformed or degenerate input signal
    #[error("Invalid signal: {0}")]
    InvalidSignal(#[from] SignalError),

    /// Empty, non-monotonic or zero wavelet scale sequence
    #[error("Invalid wavelet scales: {0}")]
    InvalidScales(String),

    /// Wavelet kernel with unusable parameters
    #[error("Invalid wavelet kernel: {0}")]
    InvalidKernel(String),

    /// Frequency band definition that cannot be evaluated
    #[error("Invalid frequency band: {0}")]
    InvalidBand(String),

    /// Upstream representation required by the active schema is missing
    #[error("Incomplete feature set: {feature} requires {missing}")]
    IncompleteFeatureSet { feature: String, missing: String },
}
