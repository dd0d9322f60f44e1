//! Sampled Signal

use crate::error::SignalError;
use crate::validator::{validate_sample_rate, validate_samples};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable, validated sensor waveform
///
/// Samples are shared behind an `Arc`, so cloning a signal (for example to keep a
/// reference inside an analysis summary) never copies the trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSignal", into = "RawSignal")]
pub struct Signal {
    samples: Arc<[f64]>,
    sample_rate: f64,
    label: Option<String>,
}

impl Signal {
    /// Build a signal, rejecting short traces, non-finite samples and bad rates
    pub fn new(samples: impl Into<Vec<f64>>, sample_rate: f64) -> Result<Self, SignalError> {
        let samples = samples.into();
        validate_samples(&samples)?;
        validate_sample_rate(sample_rate)?;

        Ok(Self {
            samples: samples.into(),
            sample_rate,
            label: None,
        })
    }

    /// Attach a unit/channel label (e.g. `"vibration [g]"`)
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Raw samples
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Sampling rate (Hz)
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Unit/channel label, if any
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of samples (always >= 2)
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; kept for API symmetry with slices
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration covered by the samples (seconds)
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    /// Time stamp of every sample (seconds, t = i / fs)
    pub fn time_axis(&self) -> Vec<f64> {
        (0..self.samples.len())
            .map(|i| i as f64 / self.sample_rate)
            .collect()
    }
}

/// Wire form used to route deserialization through validation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSignal {
    samples: Vec<f64>,
    sample_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl TryFrom<RawSignal> for Signal {
    type Error = SignalError;

    fn try_from(raw: RawSignal) -> Result<Self, Self::Error> {
        let signal = Signal::new(raw.samples, raw.sample_rate)?;
        Ok(match raw.label {
            Some(label) => signal.with_label(label),
            None => signal,
        })
    }
}

impl From<Signal> for RawSignal {
    fn from(signal: Signal) -> Self {
        Self {
            samples: signal.samples.to_vec(),
            sample_rate: signal.sample_rate,
            label: signal.label,
        }
    }
}
