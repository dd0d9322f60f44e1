//! Time-Domain Statistics

use crate::error::AnalysisError;
use serde::Serialize;
use tracing::debug;
use waveform::{validate_samples, Signal};

/// Descriptive statistics of a waveform, together with the waveform itself
///
/// Moments use population normalisation (denominator N). Kurtosis is the plain fourth
/// standardized moment, not excess kurtosis.
#[derive(Debug, Clone, Serialize)]
pub struct TimeDomainSummary {
    /// The analysed waveform (shared, not copied)
    pub signal: Signal,
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Third standardized moment E[(x-mu)^3] / sigma^3
    pub skewness: f64,
    /// Fourth standardized moment E[(x-mu)^4] / sigma^4
    pub kurtosis: f64,
    /// Minimum sample
    pub min: f64,
    /// Maximum sample
    pub max: f64,
    /// max - min
    pub peak_to_peak: f64,
    /// Root mean square
    pub rms: f64,
    /// Mean absolute value
    pub mean_abs: f64,
    /// Mean square (signal energy per sample)
    pub energy: f64,
    /// Peak absolute value divided by RMS
    pub crest_factor: f64,
    /// Sign changes about the mean
    pub zero_crossings: usize,
}

impl TimeDomainSummary {
    /// Kurtosis minus 3 (Fisher definition); 0 for a constant signal
    pub fn excess_kurtosis(&self) -> f64 {
        if self.std_dev > 0.0 {
            self.kurtosis - 3.0
        } else {
            0.0
        }
    }

    /// Waveform trace as (time, amplitude) arrays for plotting
    pub fn trace(&self) -> (Vec<f64>, Vec<f64>) {
        (self.signal.time_axis(), self.signal.samples().to_vec())
    }
}

/// Computes [`TimeDomainSummary`] values
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeDomainAnalyzer;

impl TimeDomainAnalyzer {
    /// Create a new analyzer
    pub fn new() -> Self {
        Self
    }

    /// Summarize a signal
    pub fn summarize(&self, signal: &Signal) -> Result<TimeDomainSummary, AnalysisError> {
        let values = signal.samples();
        validate_samples(values)?;

        let n = values.len() as f64;
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let peak = min.abs().max(max.abs());

        // Moments are taken on samples divided by the peak magnitude so that large
        // finite inputs cannot overflow the fourth powers
        let scale = if peak > 0.0 { peak } else { 1.0 };
        let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
        let scaled_mean = scaled.iter().sum::<f64>() / n;
        let mean = scaled_mean * scale;

        // Central moments
        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        for &v in &scaled {
            let d = v - scaled_mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }

        // An exactly constant trace has zero spread even if the mean picked up rounding
        let scaled_variance = if min == max { 0.0 } else { m2 / n };
        let scaled_std = scaled_variance.sqrt();
        let std_dev = scaled_std * scale;

        let (skewness, kurtosis) = if scaled_std > 0.0 {
            (
                (m3 / n) / (scaled_std * scaled_std * scaled_std),
                (m4 / n) / (scaled_variance * scaled_variance),
            )
        } else {
            (0.0, 0.0)
        };

        let scaled_energy = scaled.iter().map(|v| v * v).sum::<f64>() / n;
        let scaled_rms = scaled_energy.sqrt();
        let rms = scaled_rms * scale;
        let energy = scaled_energy * scale * scale;
        let mean_abs = scaled.iter().map(|v| v.abs()).sum::<f64>() / n * scale;
        let crest_factor = if scaled_rms > 0.0 {
            (peak / scale) / scaled_rms
        } else {
            0.0
        };

        let mut zero_crossings = 0;
        for pair in scaled.windows(2) {
            let prev = pair[0] - scaled_mean;
            let curr = pair[1] - scaled_mean;
            if prev != 0.0 && curr != 0.0 && prev.signum() != curr.signum() {
                zero_crossings += 1;
            }
        }

        debug!(
            "Time-domain summary: n={}, mean={:.4}, std={:.4}, kurtosis={:.4}",
            values.len(),
            mean,
            std_dev,
            kurtosis
        );

        Ok(TimeDomainSummary {
            signal: signal.clone(),
            mean,
            std_dev,
            skewness,
            kurtosis,
            min,
            max,
            peak_to_peak: max - min,
            rms,
            mean_abs,
            energy,
            crest_factor,
            zero_crossings,
        })
    }
}
