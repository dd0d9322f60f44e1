//! Feature Vector Assembly

use crate::cwt::TimeFrequencyMap;
use crate::error::AnalysisError;
use crate::fft::Spectrum;
use crate::schema::{BandAggregation, FeatureId, FeatureSchema};
use crate::statistics::TimeDomainSummary;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed-length feature values tagged with the schema that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFeatureVector", into = "RawFeatureVector")]
pub struct FeatureVector {
    schema: Arc<FeatureSchema>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Pair values with a schema; lengths must agree
    pub fn new(schema: Arc<FeatureSchema>, values: Vec<f64>) -> Option<Self> {
        (schema.len() == values.len()).then_some(Self { schema, values })
    }

    /// Schema that produced the values
    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    /// Values in schema order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of values (equals the schema length)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a vector under an empty schema
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named feature, if the schema contains it
    pub fn get(&self, id: &FeatureId) -> Option<f64> {
        self.schema
            .features()
            .iter()
            .position(|f| f == id)
            .and_then(|i| self.values.get(i).copied())
    }

    /// (name, value) pairs in schema order
    pub fn named(&self) -> Vec<(String, f64)> {
        self.schema
            .feature_names()
            .into_iter()
            .zip(self.values.iter().copied())
            .collect()
    }
}

/// Wire form used to route deserialization through the length check
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFeatureVector {
    schema: Arc<FeatureSchema>,
    values: Vec<f64>,
}

impl TryFrom<RawFeatureVector> for FeatureVector {
    type Error = String;

    fn try_from(raw: RawFeatureVector) -> Result<Self, Self::Error> {
        let (expected, actual) = (raw.schema.len(), raw.values.len());
        FeatureVector::new(raw.schema, raw.values).ok_or_else(|| {
            format!("feature vector has {actual} values but its schema lists {expected} features")
        })
    }
}

impl From<FeatureVector> for RawFeatureVector {
    fn from(vector: FeatureVector) -> Self {
        Self {
            schema: vector.schema,
            values: vector.values,
        }
    }
}

/// Reduces analyzer outputs to a [`FeatureVector`] under one schema
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    schema: Arc<FeatureSchema>,
}

impl FeatureExtractor {
    /// Create an extractor for the given schema
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self { schema }
    }

    /// Schema every produced vector carries
    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    /// Build the feature vector
    ///
    /// Fails with [`AnalysisError::IncompleteFeatureSet`] when the schema needs a
    /// spectrum or a CWT scale that was not supplied.
    pub fn extract(
        &self,
        summary: &TimeDomainSummary,
        spectrum: Option<&Spectrum>,
        time_frequency: Option<&TimeFrequencyMap>,
    ) -> Result<FeatureVector, AnalysisError> {
        let values = self
            .schema
            .features()
            .iter()
            .map(|feature| self.evaluate(feature, summary, spectrum, time_frequency))
            .collect::<Result<Vec<f64>, _>>()?;

        debug!(
            "Extracted {} features under schema '{}'",
            values.len(),
            self.schema.name()
        );

        Ok(FeatureVector {
            schema: Arc::clone(&self.schema),
            values,
        })
    }

    fn evaluate(
        &self,
        feature: &FeatureId,
        summary: &TimeDomainSummary,
        spectrum: Option<&Spectrum>,
        time_frequency: Option<&TimeFrequencyMap>,
    ) -> Result<f64, AnalysisError> {
        let value = match *feature {
            FeatureId::Mean => summary.mean,
            FeatureId::StdDev => summary.std_dev,
            FeatureId::Skewness => summary.skewness,
            FeatureId::Kurtosis => summary.kurtosis,
            FeatureId::ExcessKurtosis => summary.excess_kurtosis(),
            FeatureId::PeakToPeak => summary.peak_to_peak,
            FeatureId::Rms => summary.rms,
            FeatureId::MeanAbs => summary.mean_abs,
            FeatureId::Energy => summary.energy,
            FeatureId::CrestFactor => summary.crest_factor,
            FeatureId::BandEnergy { low_hz, high_hz } => {
                let spectrum = spectrum.ok_or_else(|| AnalysisError::IncompleteFeatureSet {
                    feature: feature.to_string(),
                    missing: "spectrum".to_string(),
                })?;
                self.band_energy(spectrum, low_hz, high_hz)
            }
            FeatureId::CwtMean { scale } => {
                let missing = || AnalysisError::IncompleteFeatureSet {
                    feature: feature.to_string(),
                    missing: format!("time-frequency map at scale {scale}"),
                };
                let map = time_frequency.ok_or_else(missing)?;
                let row = map.scale_index(scale).ok_or_else(missing)?;
                let magnitudes = map.row(row);
                magnitudes.sum() / magnitudes.len() as f64
            }
        };
        Ok(value)
    }

    fn band_energy(&self, spectrum: &Spectrum, low_hz: f64, high_hz: f64) -> f64 {
        let (total, count) = spectrum
            .band(low_hz, high_hz)
            .fold((0.0, 0usize), |(sum, n), m| (sum + m, n + 1));

        match (self.schema.band_aggregation(), count) {
            (_, 0) => {
                warn!(
                    "Band [{}, {}) Hz holds no spectrum bins (resolution {} Hz, Nyquist {} Hz), contributes 0",
                    low_hz,
                    high_hz,
                    spectrum.resolution_hz(),
                    spectrum.sample_rate() / 2.0
                );
                0.0
            }
            (BandAggregation::Sum, _) => total,
            (BandAggregation::Mean, n) => total / n as f64,
        }
    }
}
