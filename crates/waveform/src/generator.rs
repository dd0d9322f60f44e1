//! Synthetic Waveform Generator

use crate::error::SourceError;
use crate::signal::Signal;
use crate::WaveformSource;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// One sinusoidal component of a synthetic signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    /// Frequency (Hz)
    pub frequency_hz: f64,
    /// Peak amplitude
    pub amplitude: f64,
    /// Phase offset (radians)
    #[serde(default)]
    pub phase: f64,
}

impl Tone {
    /// Zero-phase tone
    pub fn new(frequency_hz: f64, amplitude: f64) -> Self {
        Self {
            frequency_hz,
            amplitude,
            phase: 0.0,
        }
    }
}

/// Sum-of-tones generator with optional DC offset and Gaussian noise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticSource {
    /// Sinusoidal components
    pub tones: Vec<Tone>,
    /// Constant offset added to every sample
    #[serde(default)]
    pub offset: f64,
    /// Standard deviation of additive white Gaussian noise (0 disables noise)
    #[serde(default)]
    pub noise_std: f64,
    /// Seed for the noise generator
    #[serde(default)]
    pub seed: u64,
    /// Sampling rate (Hz)
    pub sample_rate: f64,
    /// Number of samples to produce
    pub num_samples: usize,
}

impl SyntheticSource {
    /// Silent generator (all zeros) of the given length
    pub fn new(sample_rate: f64, num_samples: usize) -> Self {
        Self {
            tones: Vec::new(),
            offset: 0.0,
            noise_std: 0.0,
            seed: 0,
            sample_rate,
            num_samples,
        }
    }

    /// Reference pump signal: 50 Hz + 0.5 x 120 Hz, 1 s at 1 kHz
    pub fn pump_reference() -> Self {
        Self::new(1000.0, 1000)
            .with_tone(Tone::new(50.0, 1.0))
            .with_tone(Tone::new(120.0, 0.5))
    }

    /// Add a sinusoidal component
    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tones.push(tone);
        self
    }

    /// Set the DC offset
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Add seeded Gaussian noise
    pub fn with_noise(mut self, noise_std: f64, seed: u64) -> Self {
        self.noise_std = noise_std;
        self.seed = seed;
        self
    }

    /// Render the samples
    pub fn generate(&self) -> Result<Signal, SourceError> {
        debug!(
            "Generating synthetic signal: {} tones, {} samples at {} Hz",
            self.tones.len(),
            self.num_samples,
            self.sample_rate
        );

        let mut samples: Vec<f64> = (0..self.num_samples)
            .map(|i| {
                let t = i as f64 / self.sample_rate;
                self.offset
                    + self
                        .tones
                        .iter()
                        .map(|tone| {
                            tone.amplitude * (2.0 * PI * tone.frequency_hz * t + tone.phase).sin()
                        })
                        .sum::<f64>()
            })
            .collect();

        if !(self.noise_std.is_finite() && self.noise_std >= 0.0) {
            return Err(SourceError::InvalidParameter(format!(
                "noise standard deviation must be finite and non-negative, got {}",
                self.noise_std
            )));
        }
        if self.noise_std > 0.0 {
            let noise = Normal::new(0.0, self.noise_std)
                .map_err(|e| SourceError::InvalidParameter(format!("noise distribution: {e}")))?;
            let mut rng = StdRng::seed_from_u64(self.seed);
            for sample in samples.iter_mut() {
                *sample += noise.sample(&mut rng);
            }
        }

        Ok(Signal::new(samples, self.sample_rate)?.with_label("synthetic"))
    }
}

impl WaveformSource for SyntheticSource {
    fn load(&self) -> Result<Signal, SourceError> {
        self.generate()
    }
}
