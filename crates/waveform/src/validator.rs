//! Ingestion Checks for Raw Samples

use crate::error::SignalError;

/// Minimum number of samples a signal must carry
pub const MIN_SAMPLES: usize = 2;

/// Check a raw sample sequence against the signal invariants
///
/// Rejects sequences shorter than [`MIN_SAMPLES`] and the first NaN/Inf sample found.
pub fn validate_samples(samples: &[f64]) -> Result<(), SignalError> {
    if samples.len() < MIN_SAMPLES {
        return Err(SignalError::TooShort {
            len: samples.len(),
            min: MIN_SAMPLES,
        });
    }

    match samples.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(SignalError::NonFinite {
            index,
            value: samples[index],
        }),
        None => Ok(()),
    }
}

/// Check a sampling rate (Hz)
pub fn validate_sample_rate(sample_rate: f64) -> Result<(), SignalError> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(SignalError::InvalidSampleRate(sample_rate))
    }
}
