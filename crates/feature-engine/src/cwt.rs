//! Continuous Wavelet Transform
//!
//! Each scale s produces one row of coefficients
//! `W(s, n) = s^-1/2 * sum_k x[n + k] * conj(psi(k / s))`, evaluated as an FFT
//! linear convolution over the kernel support `|k / s| <= 8`. Samples outside the
//! signal come from the analyzer's fixed [`Padding`] policy, never from the data.

use crate::error::AnalysisError;
use ndarray::{Array2, ArrayView1, Axis};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;
use waveform::{validate_samples, Signal};

/// Half-width of every kernel's effective support, in units of t
pub const KERNEL_SUPPORT: f64 = 8.0;

/// Largest scale in the default scale sequence
pub const DEFAULT_MAX_SCALE: u32 = 127;

/// Largest accepted scale; kernel length grows as `2 * ceil(8 s) + 1` taps
pub const MAX_SCALE: u32 = 1 << 16;

/// Morlet modulation frequency (radians per unit t)
const MORLET_OMEGA0: f64 = 5.0;

/// Mother wavelet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WaveletKernel {
    /// Real Morlet: exp(-t^2/2) cos(5t)
    Morlet,
    /// Complex Morlet: (pi B)^-1/2 exp(-t^2/B) exp(i 2 pi C t)
    ComplexMorlet {
        /// Bandwidth parameter B
        bandwidth: f64,
        /// Centre frequency C (cycles per unit t)
        center_frequency: f64,
    },
    /// Mexican hat (negative normalized second derivative of a Gaussian)
    MexicanHat,
}

impl Default for WaveletKernel {
    fn default() -> Self {
        WaveletKernel::ComplexMorlet {
            bandwidth: 1.0,
            center_frequency: 1.0,
        }
    }
}

impl WaveletKernel {
    /// Centre frequency in cycles per unit t
    pub fn center_frequency(&self) -> f64 {
        match *self {
            WaveletKernel::Morlet => MORLET_OMEGA0 / (2.0 * PI),
            WaveletKernel::ComplexMorlet {
                center_frequency, ..
            } => center_frequency,
            WaveletKernel::MexicanHat => 0.25,
        }
    }

    /// Short identifier used in logs and feature names
    pub fn name(&self) -> &'static str {
        match self {
            WaveletKernel::Morlet => "morlet",
            WaveletKernel::ComplexMorlet { .. } => "complex_morlet",
            WaveletKernel::MexicanHat => "mexican_hat",
        }
    }

    /// Reject non-positive or non-finite parameters
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if let WaveletKernel::ComplexMorlet {
            bandwidth,
            center_frequency,
        } = *self
        {
            if !(bandwidth.is_finite() && bandwidth > 0.0) {
                return Err(AnalysisError::InvalidKernel(format!(
                    "complex Morlet bandwidth must be positive, got {bandwidth}"
                )));
            }
            if !(center_frequency.is_finite() && center_frequency > 0.0) {
                return Err(AnalysisError::InvalidKernel(format!(
                    "complex Morlet centre frequency must be positive, got {center_frequency}"
                )));
            }
        }
        Ok(())
    }

    /// psi(t)
    pub fn evaluate(&self, t: f64) -> Complex<f64> {
        match *self {
            WaveletKernel::Morlet => {
                Complex::new((-0.5 * t * t).exp() * (MORLET_OMEGA0 * t).cos(), 0.0)
            }
            WaveletKernel::ComplexMorlet {
                bandwidth,
                center_frequency,
            } => {
                let envelope = (PI * bandwidth).powf(-0.5) * (-t * t / bandwidth).exp();
                Complex::from_polar(envelope, 2.0 * PI * center_frequency * t)
            }
            WaveletKernel::MexicanHat => {
                let norm = 2.0 / (3.0f64.sqrt() * PI.powf(0.25));
                Complex::new(norm * (1.0 - t * t) * (-0.5 * t * t).exp(), 0.0)
            }
        }
    }

    /// Physical frequency (Hz) represented by a scale
    pub fn scale_to_frequency(&self, scale: f64, sample_rate: f64) -> f64 {
        self.center_frequency() * sample_rate / scale
    }

    /// Scale whose represented frequency is `frequency_hz`
    pub fn frequency_to_scale(&self, frequency_hz: f64, sample_rate: f64) -> f64 {
        self.center_frequency() * sample_rate / frequency_hz
    }
}

/// How samples beyond either end of the signal are supplied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Samples outside the signal are zero
    #[default]
    Zero,
    /// Half-sample mirror: x[-1] = x[0], x[N] = x[N-1], repeating with period 2N
    Symmetric,
}

impl Padding {
    fn sample(self, samples: &[f64], index: isize) -> f64 {
        let n = samples.len() as isize;
        if (0..n).contains(&index) {
            return samples[index as usize];
        }
        match self {
            Padding::Zero => 0.0,
            Padding::Symmetric => {
                let r = index.rem_euclid(2 * n);
                let mirrored = if r < n { r } else { 2 * n - 1 - r };
                samples[mirrored as usize]
            }
        }
    }
}

/// Scales 1..=127
pub fn default_scales() -> Vec<u32> {
    (1..=DEFAULT_MAX_SCALE).collect()
}

/// Scales must be non-empty, strictly increasing, non-zero and at most [`MAX_SCALE`]
pub fn validate_scales(scales: &[u32]) -> Result<(), AnalysisError> {
    if scales.is_empty() {
        return Err(AnalysisError::InvalidScales(
            "scale sequence is empty".to_string(),
        ));
    }
    if scales[0] == 0 {
        return Err(AnalysisError::InvalidScales(
            "scale 0 is not a valid dilation".to_string(),
        ));
    }
    if let Some(pair) = scales.windows(2).find(|pair| pair[1] <= pair[0]) {
        return Err(AnalysisError::InvalidScales(format!(
            "scales must be strictly increasing, found {} followed by {}",
            pair[0], pair[1]
        )));
    }
    if let Some(&last) = scales.last().filter(|&&s| s > MAX_SCALE) {
        return Err(AnalysisError::InvalidScales(format!(
            "scale {last} exceeds the maximum of {MAX_SCALE}"
        )));
    }
    Ok(())
}

/// Magnitude surface indexed by (scale, time)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeFrequencyMap {
    magnitudes: Array2<f64>,
    scales: Vec<u32>,
    frequencies: Vec<f64>,
    kernel: WaveletKernel,
    padding: Padding,
    sample_rate: f64,
}

impl TimeFrequencyMap {
    /// (scale count, sample count)
    pub fn shape(&self) -> (usize, usize) {
        self.magnitudes.dim()
    }

    /// |W(s, n)|, one row per scale
    pub fn magnitudes(&self) -> &Array2<f64> {
        &self.magnitudes
    }

    /// Scales, one per row
    pub fn scales(&self) -> &[u32] {
        &self.scales
    }

    /// Frequency (Hz) represented by each row
    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Kernel the map was computed with
    pub fn kernel(&self) -> WaveletKernel {
        self.kernel
    }

    /// Boundary policy the map was computed with
    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Sampling rate of the source signal (Hz)
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Row index holding `scale`
    pub fn scale_index(&self, scale: u32) -> Option<usize> {
        self.scales.binary_search(&scale).ok()
    }

    /// Magnitudes of one row
    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.magnitudes.row(index)
    }

    /// Mean magnitude of every row
    pub fn mean_per_scale(&self) -> Vec<f64> {
        self.magnitudes
            .mean_axis(Axis(1))
            .map(|means| means.to_vec())
            .unwrap_or_default()
    }

    /// Scales recovered from the frequency axis through the kernel's centre frequency
    pub fn scales_from_frequencies(&self) -> Vec<f64> {
        self.frequencies
            .iter()
            .map(|&f| self.kernel.frequency_to_scale(f, self.sample_rate))
            .collect()
    }

    /// Row-major copy for plotting
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.magnitudes
            .outer_iter()
            .map(|row| row.to_vec())
            .collect()
    }

    /// Time of every column (seconds)
    pub fn time_axis(&self) -> Vec<f64> {
        (0..self.magnitudes.ncols())
            .map(|i| i as f64 / self.sample_rate)
            .collect()
    }
}

/// Computes [`TimeFrequencyMap`] values
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeFrequencyAnalyzer {
    padding: Padding,
}

impl TimeFrequencyAnalyzer {
    /// Analyzer with the given boundary policy
    pub fn new(padding: Padding) -> Self {
        Self { padding }
    }

    /// Boundary policy in use
    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Decompose a signal over the given scales
    pub fn decompose(
        &self,
        signal: &Signal,
        scales: &[u32],
        kernel: &WaveletKernel,
    ) -> Result<TimeFrequencyMap, AnalysisError> {
        let samples = signal.samples();
        validate_samples(samples)?;
        validate_scales(scales)?;
        kernel.validate()?;

        let n = samples.len();
        let sample_rate = signal.sample_rate();
        let mut planner = FftPlanner::<f64>::new();
        let mut magnitudes = Array2::<f64>::zeros((scales.len(), n));

        for (row, &scale) in scales.iter().enumerate() {
            let coefficients = self.convolve_scale(&mut planner, samples, scale as f64, kernel);
            for (cell, c) in magnitudes.row_mut(row).iter_mut().zip(coefficients) {
                *cell = c.norm();
            }
        }

        let frequencies = scales
            .iter()
            .map(|&s| kernel.scale_to_frequency(s as f64, sample_rate))
            .collect();

        debug!(
            "CWT: kernel={}, {} scales x {} samples, padding={:?}",
            kernel.name(),
            scales.len(),
            n,
            self.padding
        );

        Ok(TimeFrequencyMap {
            magnitudes,
            scales: scales.to_vec(),
            frequencies,
            kernel: *kernel,
            padding: self.padding,
            sample_rate,
        })
    }

    fn convolve_scale(
        &self,
        planner: &mut FftPlanner<f64>,
        samples: &[f64],
        scale: f64,
        kernel: &WaveletKernel,
    ) -> Vec<Complex<f64>> {
        let zero = Complex::new(0.0, 0.0);
        let n = samples.len();
        let half = (KERNEL_SUPPORT * scale).ceil() as usize;
        let taps = 2 * half + 1;
        let pad = match self.padding {
            Padding::Zero => 0,
            Padding::Symmetric => half,
        };
        let extended = n + 2 * pad;
        let fft_len = (extended + taps - 1).next_power_of_two();

        let mut x: Vec<Complex<f64>> = (0..fft_len)
            .map(|i| {
                if i < extended {
                    let value = self.padding.sample(samples, i as isize - pad as isize);
                    Complex::new(value, 0.0)
                } else {
                    zero
                }
            })
            .collect();

        // h[q] = conj(psi((half - q) / s)) / sqrt(s), so x * h correlates with psi
        let norm = scale.sqrt().recip();
        let mut h = vec![zero; fft_len];
        for (q, tap) in h.iter_mut().take(taps).enumerate() {
            let t = (half as f64 - q as f64) / scale;
            *tap = kernel.evaluate(t).conj() * norm;
        }

        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);
        forward.process(&mut x);
        forward.process(&mut h);
        for (a, b) in x.iter_mut().zip(h.iter()) {
            *a *= *b;
        }
        inverse.process(&mut x);

        let scale_back = 1.0 / fft_len as f64;
        (0..n).map(|i| x[i + half + pad] * scale_back).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tone(freq: f64, fs: f64, n: usize) -> Signal {
        let samples: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect();
        Signal::new(samples, fs).unwrap()
    }

    /// Direct evaluation of W(s, n) for cross-checking the FFT path
    fn direct(samples: &[f64], padding: Padding, scale: f64, kernel: &WaveletKernel, n: usize) -> f64 {
        let half = (KERNEL_SUPPORT * scale).ceil() as isize;
        let mut acc = Complex::new(0.0, 0.0);
        for k in -half..=half {
            let x = padding.sample(samples, n as isize + k);
            acc += kernel.evaluate(k as f64 / scale).conj() * x;
        }
        (acc / scale.sqrt()).norm()
    }

    #[test]
    fn test_default_scales() {
        let scales = default_scales();
        assert_eq!(scales.len(), 127);
        assert_eq!(scales[0], 1);
        assert_eq!(scales[126], 127);
        assert!(validate_scales(&scales).is_ok());
    }

    #[test]
    fn test_invalid_scales() {
        let signal = tone(10.0, 100.0, 64);
        let analyzer = TimeFrequencyAnalyzer::default();
        let kernel = WaveletKernel::default();

        for scales in [
            vec![],
            vec![0, 1, 2],
            vec![1, 3, 2],
            vec![2, 2],
            vec![1, u32::MAX],
            vec![MAX_SCALE + 1],
        ] {
            let result = analyzer.decompose(&signal, &scales, &kernel);
            assert!(
                matches!(result, Err(AnalysisError::InvalidScales(_))),
                "scales {scales:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_largest_scale_accepted() {
        assert!(validate_scales(&[1, MAX_SCALE]).is_ok());
    }

    #[test]
    fn test_invalid_kernel() {
        let signal = tone(10.0, 100.0, 64);
        let kernel = WaveletKernel::ComplexMorlet {
            bandwidth: 0.0,
            center_frequency: 1.0,
        };
        let result = TimeFrequencyAnalyzer::default().decompose(&signal, &[1, 2], &kernel);
        assert!(matches!(result, Err(AnalysisError::InvalidKernel(_))));
    }

    #[test]
    fn test_fft_matches_direct_sum() {
        let samples: Vec<f64> = (0..50).map(|i| ((i * 7 % 11) as f64 - 5.0) / 3.0).collect();
        let signal = Signal::new(samples.clone(), 100.0).unwrap();

        for padding in [Padding::Zero, Padding::Symmetric] {
            for kernel in [
                WaveletKernel::Morlet,
                WaveletKernel::default(),
                WaveletKernel::MexicanHat,
            ] {
                let map = TimeFrequencyAnalyzer::new(padding)
                    .decompose(&signal, &[1, 3, 9], &kernel)
                    .unwrap();
                for (row, &scale) in map.scales().iter().enumerate() {
                    for n in [0, 1, 25, 48, 49] {
                        let expected = direct(&samples, padding, scale as f64, &kernel, n);
                        let actual = map.magnitudes()[[row, n]];
                        assert!(
                            (expected - actual).abs() < 1e-9,
                            "{padding:?} {} s={scale} n={n}: {expected} vs {actual}",
                            kernel.name()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_tone_energy_peaks_at_matching_scale() {
        // Complex Morlet with C = 1: 50 Hz at 1 kHz maps to scale 20
        let signal = tone(50.0, 1000.0, 1000);
        let map = TimeFrequencyAnalyzer::default()
            .decompose(&signal, &default_scales(), &WaveletKernel::default())
            .unwrap();

        let means = map.mean_per_scale();
        let best = means
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| map.scales()[i])
            .unwrap();
        assert!((18..=23).contains(&best), "peak at scale {best}");
        assert!((map.frequencies()[19] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_padding_suppresses_edge_response() {
        // Mexican hat has zero mean, so a constant input only responds at zero-padded edges
        let signal = Signal::new(vec![1.0; 200], 100.0).unwrap();
        let kernel = WaveletKernel::MexicanHat;

        let zero = TimeFrequencyAnalyzer::new(Padding::Zero)
            .decompose(&signal, &[4], &kernel)
            .unwrap();
        let mirrored = TimeFrequencyAnalyzer::new(Padding::Symmetric)
            .decompose(&signal, &[4], &kernel)
            .unwrap();

        let zero_edge = zero.row(0).iter().take(10).cloned().fold(0.0, f64::max);
        let mirrored_edge = mirrored.row(0).iter().take(10).cloned().fold(0.0, f64::max);
        assert!(zero_edge > 0.1);
        assert!(mirrored_edge < 1e-6);
    }

    #[test]
    fn test_scale_frequency_round_trip() {
        let signal = tone(5.0, 250.0, 128);
        for kernel in [
            WaveletKernel::Morlet,
            WaveletKernel::default(),
            WaveletKernel::MexicanHat,
        ] {
            let map = TimeFrequencyAnalyzer::default()
                .decompose(&signal, &[1, 2, 5, 17, 40], &kernel)
                .unwrap();
            for (recovered, &original) in map.scales_from_frequencies().iter().zip(map.scales()) {
                assert!((recovered - original as f64).abs() < 1e-9 * original as f64);
            }
        }
    }

    #[test]
    fn test_lookup_helpers() {
        let signal = tone(5.0, 100.0, 32);
        let map = TimeFrequencyAnalyzer::default()
            .decompose(&signal, &[2, 4, 8], &WaveletKernel::Morlet)
            .unwrap();
        assert_eq!(map.scale_index(4), Some(1));
        assert_eq!(map.scale_index(3), None);
        assert_eq!(map.to_rows().len(), 3);
        assert_eq!(map.to_rows()[0].len(), 32);
        assert_eq!(map.time_axis().len(), 32);
    }

    #[test]
    fn test_kernel_serde_tags() {
        let json = serde_json::to_string(&WaveletKernel::MexicanHat).unwrap();
        assert_eq!(json, r#"{"type":"mexican_hat"}"#);
        let parsed: WaveletKernel = serde_json::from_str(
            r#"{"type":"complex_morlet","bandwidth":1.5,"center_frequency":1.0}"#,
        )
        .unwrap();
        assert_eq!(parsed.center_frequency(), 1.0);
    }

    proptest! {
        #[test]
        fn map_dimensions(
            values in proptest::collection::vec(-10.0f64..10.0, 2..120),
            max_scale in 1u32..24,
            kernel_choice in 0usize..3,
        ) {
            let kernel = [
                WaveletKernel::Morlet,
                WaveletKernel::default(),
                WaveletKernel::MexicanHat,
            ][kernel_choice];
            let scales: Vec<u32> = (1..=max_scale).collect();
            let n = values.len();
            let signal = Signal::new(values, 100.0).unwrap();
            let map = TimeFrequencyAnalyzer::default().decompose(&signal, &scales, &kernel).unwrap();
            prop_assert_eq!(map.shape(), (scales.len(), n));
            prop_assert_eq!(map.frequencies().len(), scales.len());
        }
    }
}
