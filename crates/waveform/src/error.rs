//! Waveform Error Types

use thiserror::Error;

/// Reasons a sample sequence is rejected at ingestion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// Fewer samples than any analyzer can work with
    #[error("Signal too short: {len} samples, need at least {min}")]
    TooShort { len: usize, min: usize },

    /// NaN or infinite sample
    #[error("Non-finite sample {value} at index {index}")]
    NonFinite { index: usize, value: f64 },

    /// Sampling rate must be a positive finite frequency
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),
}

/// Errors raised while pulling a signal out of a waveform source
#[derive(Debug, Error)]
pub enum SourceError {
    /// File could not be opened or read
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed delimited record
    #[error("Malformed record: {0}")]
    Csv(#[from] csv::Error),

    /// Cell that is not a floating-point number
    #[error("Row {row}, column {column}: cannot parse {text:?} as a sample")]
    Parse {
        row: usize,
        column: usize,
        text: String,
    },

    /// Generator parameter outside its valid range
    #[error("Invalid source parameter: {0}")]
    InvalidParameter(String),

    /// Requested column or row does not exist in the file
    #[error("Missing field: {0}")]
    MissingField(String),

    /// The decoded samples do not form a valid signal
    #[error(transparent)]
    Signal(#[from] SignalError),
}
