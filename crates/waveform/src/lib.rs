//! Waveform Sources
//!
//! Validated sampled signals plus the sources that produce them: a synthetic
//! sum-of-tones generator and a delimited text file loader.

mod error;
mod generator;
mod loader;
mod signal;
mod validator;

pub use error::{SignalError, SourceError};
pub use generator::{SyntheticSource, Tone};
pub use loader::{DelimitedSource, Layout};
pub use signal::Signal;
pub use validator::{validate_sample_rate, validate_samples, MIN_SAMPLES};

/// Anything that can supply a raw sampled signal with its sampling rate
pub trait WaveformSource {
    /// Produce a validated signal
    fn load(&self) -> Result<Signal, SourceError>;
}
