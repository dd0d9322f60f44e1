//! Diagnosis configuration

use ::config::{Config, Environment, File};
use fallback::{Statistic, DEFAULT_THRESHOLD};
use feature_engine::{
    bands_from_edges, validate_scales, BandAggregation, FeatureSchema, Padding,
    WaveletKernel, MAX_SCALE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Prefix of environment overrides, e.g. `PUMPDIAG__SAMPLING_RATE=2000`
pub const ENV_PREFIX: &str = "PUMPDIAG";

/// Errors raised while loading or checking configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Signal sampled at {actual} Hz but configuration expects {configured} Hz")]
    SampleRateMismatch { configured: f64, actual: f64 },

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Which optional analyzers run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerToggles {
    /// Compute the one-sided spectrum
    pub spectrum: bool,
    /// Compute the CWT map
    pub time_frequency: bool,
}

impl Default for AnalyzerToggles {
    fn default() -> Self {
        Self {
            spectrum: true,
            time_frequency: true,
        }
    }
}

/// Wavelet scales as an explicit list or an inclusive stepped range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleConfig {
    List {
        values: Vec<u32>,
    },
    Range {
        start: u32,
        end: u32,
        #[serde(default = "default_step")]
        step: u32,
    },
}

fn default_step() -> u32 {
    1
}

impl ScaleConfig {
    /// Unit-step range `start..=end`
    pub fn range(start: u32, end: u32) -> Self {
        ScaleConfig::Range {
            start,
            end,
            step: 1,
        }
    }

    /// Expand to a scale list; lists are passed through unchecked
    pub fn resolve(&self) -> Result<Vec<u32>, ConfigError> {
        match *self {
            ScaleConfig::List { ref values } => Ok(values.clone()),
            ScaleConfig::Range { start, end, step } => {
                if step == 0 {
                    return Err(ConfigError::Invalid("scale step must be at least 1".to_string()));
                }
                if end > MAX_SCALE {
                    return Err(ConfigError::Invalid(format!(
                        "scale range end {end} exceeds the maximum of {MAX_SCALE}"
                    )));
                }
                Ok((start..=end).step_by(step as usize).collect())
            }
        }
    }
}

/// Classifier variant and its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ClassifierConfig {
    Threshold {
        #[serde(default)]
        statistic: Statistic,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    Model {
        path: PathBuf,
    },
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig::Threshold {
            statistic: Statistic::Mean,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Pipeline configuration
///
/// Every field has a default, so an empty file or no file at all is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisConfig {
    /// Expected sampling rate (Hz); also the ingest rate for raw sample files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling_rate: Option<f64>,

    /// CWT boundary handling
    pub padding: Padding,

    /// Ascending edges of consecutive frequency bands (Hz)
    pub band_edges: Vec<f64>,

    /// Reduction of spectrum magnitudes within a band
    pub band_aggregation: BandAggregation,

    /// Optional analyzers to run
    pub analyzers: AnalyzerToggles,

    /// Scales computed by the time-frequency analyzer
    pub scales: ScaleConfig,

    /// Scales whose mean CWT magnitude enters the vibration schema
    pub feature_scales: ScaleConfig,

    /// Mother wavelet of the time-frequency analyzer
    pub wavelet_kernel: WaveletKernel,

    /// Classifier variant and its parameters
    pub classifier: ClassifierConfig,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            sampling_rate: None,
            padding: Padding::Zero,
            band_edges: vec![0.0, 50.0, 100.0, 200.0, 500.0],
            band_aggregation: BandAggregation::Sum,
            analyzers: AnalyzerToggles::default(),
            scales: ScaleConfig::range(1, feature_engine::DEFAULT_MAX_SCALE),
            feature_scales: ScaleConfig::range(1, 20),
            wavelet_kernel: WaveletKernel::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl DiagnosisConfig {
    /// Load from an optional TOML file layered under `PUMPDIAG__*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(
            path,
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("band_edges"),
        )
    }

    fn load_from(path: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        config.validate()?;

        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values no component could run with
    ///
    /// Explicit scale lists are left to the time-frequency analyzer, which reports
    /// them as invalid scales.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rate) = self.sampling_rate {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "sampling_rate must be positive, got {rate}"
                )));
            }
        }

        bands_from_edges(&self.band_edges)
            .map_err(|e| ConfigError::Invalid(format!("band_edges: {e}")))?;

        self.wavelet_kernel
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("wavelet_kernel: {e}")))?;

        self.scales.resolve()?;
        let feature_scales = self.feature_scales.resolve()?;
        validate_scales(&feature_scales)
            .map_err(|e| ConfigError::Invalid(format!("feature_scales: {e}")))?;

        if let ClassifierConfig::Threshold { threshold, .. } = self.classifier {
            if !threshold.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "threshold must be finite, got {threshold}"
                )));
            }
        }
        Ok(())
    }

    /// Check a signal's rate against the configured one
    pub fn check_sample_rate(&self, actual: f64) -> Result<(), ConfigError> {
        match self.sampling_rate {
            Some(configured) if (configured - actual).abs() > f64::EPSILON * configured => {
                Err(ConfigError::SampleRateMismatch { configured, actual })
            }
            _ => Ok(()),
        }
    }

    /// Scales for the time-frequency analyzer (default 1..=127)
    pub fn resolved_scales(&self) -> Result<Vec<u32>, ConfigError> {
        self.scales.resolve()
    }

    /// Vibration schema built from `band_edges` and `feature_scales`
    pub fn vibration_schema(&self) -> Result<FeatureSchema, ConfigError> {
        let feature_scales = self.feature_scales.resolve()?;
        FeatureSchema::vibration(&self.band_edges, &feature_scales)
            .map(|schema| schema.with_band_aggregation(self.band_aggregation))
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
