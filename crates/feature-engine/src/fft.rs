//! FFT-based Frequency Analysis

use crate::error::AnalysisError;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::Serialize;
use tracing::debug;
use waveform::{validate_samples, Signal};

/// One-sided magnitude spectrum of a full signal
///
/// Holds bins `0..N/2` of the DFT of an N-sample signal: `frequencies[k] = k * fs / N`,
/// `magnitudes[k] = |X[k]|`. No window is applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrum {
    frequencies: Vec<f64>,
    magnitudes: Vec<f64>,
    sample_rate: f64,
    num_samples: usize,
}

impl Spectrum {
    /// Frequency of each bin (Hz), strictly increasing from 0
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// |DFT| of each bin
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    /// Number of bins (N / 2, rounded down)
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    /// True only for a spectrum with no bins
    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Sampling rate of the source signal (Hz)
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Bin spacing fs / N (Hz)
    pub fn resolution_hz(&self) -> f64 {
        self.sample_rate / self.num_samples as f64
    }

    /// (frequency, magnitude) pairs
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
    }

    /// Bin with the largest magnitude, as (frequency, magnitude)
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.iter()
            .fold(None, |best: Option<(f64, f64)>, (f, m)| match best {
                Some((_, best_m)) if best_m >= m => best,
                _ => Some((f, m)),
            })
    }

    /// Index of the bin whose frequency is closest to `frequency_hz`
    pub fn nearest_bin(&self, frequency_hz: f64) -> usize {
        let k = (frequency_hz / self.resolution_hz()).round();
        (k.max(0.0) as usize).min(self.len().saturating_sub(1))
    }

    /// Magnitudes of bins with `low_hz <= f < high_hz`
    pub fn band(&self, low_hz: f64, high_hz: f64) -> impl Iterator<Item = f64> + '_ {
        self.iter()
            .filter(move |&(f, _)| f >= low_hz && f < high_hz)
            .map(|(_, m)| m)
    }
}

/// Computes the [`Spectrum`] of a signal
#[derive(Debug, Clone, Copy, Default)]
pub struct SpectralAnalyzer;

impl SpectralAnalyzer {
    /// Create a new analyzer
    pub fn new() -> Self {
        Self
    }

    /// Transform the whole signal (rectangular window)
    pub fn transform(&self, signal: &Signal) -> Result<Spectrum, AnalysisError> {
        let samples = signal.samples();
        validate_samples(samples)?;

        let n = samples.len();
        let mut buffer: Vec<Complex<f64>> =
            samples.iter().map(|&v| Complex::new(v, 0.0)).collect();

        let fft = FftPlanner::new().plan_fft_forward(n);
        fft.process(&mut buffer);

        let sample_rate = signal.sample_rate();
        let resolution = sample_rate / n as f64;
        let half = n / 2;

        let frequencies: Vec<f64> = (0..half).map(|k| k as f64 * resolution).collect();
        let magnitudes: Vec<f64> = buffer.iter().take(half).map(|c| c.norm()).collect();

        debug!(
            "Spectrum: {} bins, resolution {:.4} Hz",
            magnitudes.len(),
            resolution
        );

        Ok(Spectrum {
            frequencies,
            magnitudes,
            sample_rate,
            num_samples: n,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    fn tone(freq: f64, amplitude: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn test_fft_sine_wave() {
        let signal = Signal::new(tone(2.0, 1.0, 100.0, 256), 100.0).unwrap();
        let spectrum = SpectralAnalyzer::new().transform(&signal).unwrap();

        // Dominant frequency should be around 2 Hz
        let (peak_hz, _) = spectrum.peak().unwrap();
        assert!((peak_hz - 2.0).abs() < spectrum.resolution_hz());
    }

    #[test]
    fn test_bin_layout() {
        let signal = Signal::new(tone(50.0, 1.0, 1000.0, 1000), 1000.0).unwrap();
        let spectrum = SpectralAnalyzer::new().transform(&signal).unwrap();

        assert_eq!(spectrum.len(), 500);
        assert_eq!(spectrum.frequencies()[0], 0.0);
        assert!((spectrum.frequencies()[1] - 1.0).abs() < 1e-12);
        assert_eq!(spectrum.nearest_bin(50.2), 50);
        // |DFT| of an on-bin sine is A * N / 2
        assert!((spectrum.magnitudes()[50] - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_dc_bin_of_constant() {
        let signal = Signal::new(vec![2.0; 8], 8.0).unwrap();
        let spectrum = SpectralAnalyzer::new().transform(&signal).unwrap();
        assert_eq!(spectrum.len(), 4);
        assert!((spectrum.magnitudes()[0] - 16.0).abs() < 1e-12);
        assert!(spectrum.magnitudes()[1..].iter().all(|&m| m < 1e-12));
    }

    #[test]
    fn test_band_selection() {
        let signal = Signal::new(tone(50.0, 1.0, 1000.0, 1000), 1000.0).unwrap();
        let spectrum = SpectralAnalyzer::new().transform(&signal).unwrap();
        assert_eq!(spectrum.band(40.0, 60.0).count(), 20);
        let energy: f64 = spectrum.band(40.0, 60.0).sum();
        assert!(energy > 499.0);
    }

    #[test]
    fn test_two_samples() {
        let signal = Signal::new(vec![1.0, -1.0], 10.0).unwrap();
        let spectrum = SpectralAnalyzer::new().transform(&signal).unwrap();
        assert_eq!(spectrum.len(), 1);
        assert_eq!(spectrum.frequencies(), &[0.0]);
    }

    proptest! {
        #[test]
        fn spectrum_length_and_axis(
            values in proptest::collection::vec(-100.0f64..100.0, 2..600),
            fs in 1.0f64..50_000.0,
        ) {
            let n = values.len();
            let signal = Signal::new(values, fs).unwrap();
            let spectrum = SpectralAnalyzer::new().transform(&signal).unwrap();

            prop_assert_eq!(spectrum.len(), n / 2);
            prop_assert_eq!(spectrum.frequencies()[0], 0.0);
            for pair in spectrum.frequencies().windows(2) {
                prop_assert!(pair[1] > pair[0]);
            }
        }

        #[test]
        fn sine_peak_at_nearest_bin(
            bin in 5usize..200,
            offset in -0.3f64..0.3,
            amplitude in 0.1f64..10.0,
        ) {
            // 1 Hz resolution, so the nearest bin to `freq` is `bin`
            let fs = 1000.0;
            let freq = bin as f64 + offset;
            let signal = Signal::new(tone(freq, amplitude, fs, 1000), fs).unwrap();
            let spectrum = SpectralAnalyzer::new().transform(&signal).unwrap();
            let (peak_hz, _) = spectrum.peak().unwrap();
            prop_assert_eq!(spectrum.nearest_bin(peak_hz), bin, "freq={} peak={}", freq, peak_hz);
        }
    }
}
