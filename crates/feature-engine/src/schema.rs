//! Feature Schemas
//!
//! A schema is the named, ordered list of scalars packed into a
//! [`FeatureVector`](crate::FeatureVector). Two vectors are only comparable when
//! their schemas are equal.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one scalar feature
///
/// Externally tagged so schemas embed in both JSON and postcard model artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureId {
    /// Arithmetic mean
    Mean,
    /// Population standard deviation
    StdDev,
    /// Third standardized moment
    Skewness,
    /// Fourth standardized moment
    Kurtosis,
    /// Kurtosis - 3
    ExcessKurtosis,
    /// max - min
    PeakToPeak,
    /// Root mean square
    Rms,
    /// Mean absolute value
    MeanAbs,
    /// Mean square
    Energy,
    /// Peak absolute value over RMS
    CrestFactor,
    /// Aggregated spectrum magnitude over `low_hz <= f < high_hz`
    BandEnergy { low_hz: f64, high_hz: f64 },
    /// Mean CWT magnitude of one scale row
    CwtMean { scale: u32 },
}

/// Upstream representation a feature is computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    TimeDomain,
    Spectrum,
    TimeFrequency { scale: u32 },
}

impl FeatureId {
    /// Representation this feature needs
    pub fn requirement(&self) -> Requirement {
        match *self {
            FeatureId::BandEnergy { .. } => Requirement::Spectrum,
            FeatureId::CwtMean { scale } => Requirement::TimeFrequency { scale },
            _ => Requirement::TimeDomain,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Mean => write!(f, "mean"),
            FeatureId::StdDev => write!(f, "std"),
            FeatureId::Skewness => write!(f, "skewness"),
            FeatureId::Kurtosis => write!(f, "kurtosis"),
            FeatureId::ExcessKurtosis => write!(f, "excess_kurtosis"),
            FeatureId::PeakToPeak => write!(f, "peak_to_peak"),
            FeatureId::Rms => write!(f, "rms"),
            FeatureId::MeanAbs => write!(f, "mean_abs"),
            FeatureId::Energy => write!(f, "energy"),
            FeatureId::CrestFactor => write!(f, "crest_factor"),
            FeatureId::BandEnergy { low_hz, high_hz } => {
                write!(f, "band_energy[{low_hz}-{high_hz}Hz]")
            }
            FeatureId::CwtMean { scale } => write!(f, "cwt_mean[s={scale}]"),
        }
    }
}

/// How spectrum magnitudes inside a band are reduced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandAggregation {
    #[default]
    Sum,
    Mean,
}

/// Named, ordered feature layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFeatureSchema", into = "RawFeatureSchema")]
pub struct FeatureSchema {
    name: String,
    band_aggregation: BandAggregation,
    features: Vec<FeatureId>,
}

impl FeatureSchema {
    /// Build a schema, rejecting malformed band definitions
    pub fn new(name: impl Into<String>, features: Vec<FeatureId>) -> Result<Self, AnalysisError> {
        for feature in &features {
            if let FeatureId::BandEnergy { low_hz, high_hz } = *feature {
                if !(low_hz.is_finite() && high_hz.is_finite() && low_hz >= 0.0 && low_hz < high_hz) {
                    return Err(AnalysisError::InvalidBand(format!(
                        "band [{low_hz}, {high_hz}) must satisfy 0 <= low < high"
                    )));
                }
            }
        }
        Ok(Self {
            name: name.into(),
            band_aggregation: BandAggregation::default(),
            features,
        })
    }

    /// Set the band reduction
    pub fn with_band_aggregation(mut self, aggregation: BandAggregation) -> Self {
        self.band_aggregation = aggregation;
        self
    }

    /// Moments, then band energies, then mean CWT magnitude per scale
    pub fn vibration(band_edges: &[f64], feature_scales: &[u32]) -> Result<Self, AnalysisError> {
        let mut features = vec![
            FeatureId::Mean,
            FeatureId::StdDev,
            FeatureId::Skewness,
            FeatureId::Kurtosis,
        ];
        features.extend(bands_from_edges(band_edges)?);
        features.extend(
            feature_scales
                .iter()
                .map(|&scale| FeatureId::CwtMean { scale }),
        );
        Self::new("vibration", features)
    }

    /// Single excess-kurtosis feature
    pub fn acoustic() -> Self {
        Self {
            name: "acoustic".to_string(),
            band_aggregation: BandAggregation::default(),
            features: vec![FeatureId::ExcessKurtosis],
        }
    }

    /// Schema name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Band reduction applied to spectrum features
    pub fn band_aggregation(&self) -> BandAggregation {
        self.band_aggregation
    }

    /// Feature identifiers in vector order
    pub fn features(&self) -> &[FeatureId] {
        &self.features
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True for a schema without features
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Display name of every feature, in order
    pub fn feature_names(&self) -> Vec<String> {
        self.features.iter().map(ToString::to_string).collect()
    }

    /// True if any feature reads the spectrum
    pub fn needs_spectrum(&self) -> bool {
        self.features
            .iter()
            .any(|f| f.requirement() == Requirement::Spectrum)
    }

    /// Ascending, de-duplicated scales read by CWT features
    pub fn required_scales(&self) -> Vec<u32> {
        let mut scales: Vec<u32> = self
            .features
            .iter()
            .filter_map(|f| match f.requirement() {
                Requirement::TimeFrequency { scale } => Some(scale),
                _ => None,
            })
            .collect();
        scales.sort_unstable();
        scales.dedup();
        scales
    }

    /// True if any feature reads the time-frequency map
    pub fn needs_time_frequency(&self) -> bool {
        !self.required_scales().is_empty()
    }
}

/// Wire form used to route deserialization through validation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFeatureSchema {
    name: String,
    #[serde(default)]
    band_aggregation: BandAggregation,
    features: Vec<FeatureId>,
}

impl TryFrom<RawFeatureSchema> for FeatureSchema {
    type Error = AnalysisError;

    fn try_from(raw: RawFeatureSchema) -> Result<Self, Self::Error> {
        Ok(FeatureSchema::new(raw.name, raw.features)?.with_band_aggregation(raw.band_aggregation))
    }
}

impl From<FeatureSchema> for RawFeatureSchema {
    fn from(schema: FeatureSchema) -> Self {
        Self {
            name: schema.name,
            band_aggregation: schema.band_aggregation,
            features: schema.features,
        }
    }
}

/// Consecutive bands `[e0, e1), [e1, e2), ...` from ascending edges
pub fn bands_from_edges(edges: &[f64]) -> Result<Vec<FeatureId>, AnalysisError> {
    if edges.len() == 1 {
        return Err(AnalysisError::InvalidBand(
            "a single band edge defines no band".to_string(),
        ));
    }
    edges
        .windows(2)
        .map(|pair| {
            let (low_hz, high_hz) = (pair[0], pair[1]);
            if !(low_hz.is_finite() && high_hz.is_finite() && low_hz >= 0.0 && low_hz < high_hz) {
                return Err(AnalysisError::InvalidBand(format!(
                    "band edges must be finite, non-negative and ascending, found {low_hz} then {high_hz}"
                )));
            }
            Ok(FeatureId::BandEnergy { low_hz, high_hz })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vibration_layout() {
        let scales: Vec<u32> = (1..=20).collect();
        let schema = FeatureSchema::vibration(&[0.0, 50.0, 100.0], &scales).unwrap();

        assert_eq!(schema.len(), 4 + 2 + 20);
        let names = schema.feature_names();
        assert_eq!(&names[..4], &["mean", "std", "skewness", "kurtosis"]);
        assert_eq!(names[4], "band_energy[0-50Hz]");
        assert_eq!(names[5], "band_energy[50-100Hz]");
        assert_eq!(names[6], "cwt_mean[s=1]");
        assert_eq!(names[25], "cwt_mean[s=20]");
        assert!(schema.needs_spectrum());
        assert_eq!(schema.required_scales(), scales);
    }

    #[test]
    fn test_acoustic_preset() {
        let schema = FeatureSchema::acoustic();
        assert_eq!(schema.features(), &[FeatureId::ExcessKurtosis]);
        assert!(!schema.needs_spectrum());
        assert!(!schema.needs_time_frequency());
    }

    #[test]
    fn test_bad_band_edges() {
        assert!(matches!(
            bands_from_edges(&[0.0, 100.0, 50.0]),
            Err(AnalysisError::InvalidBand(_))
        ));
        assert!(matches!(
            bands_from_edges(&[10.0]),
            Err(AnalysisError::InvalidBand(_))
        ));
        assert!(bands_from_edges(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_schema_equality_includes_aggregation() {
        let a = FeatureSchema::vibration(&[0.0, 50.0], &[1, 2]).unwrap();
        let b = a.clone().with_band_aggregation(BandAggregation::Mean);
        assert_ne!(a, b);
    }

    #[test]
    fn test_schema_json() {
        let schema = FeatureSchema::new(
            "custom",
            vec![FeatureId::Rms, FeatureId::CwtMean { scale: 3 }],
        )
        .unwrap();
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains(r#"["rms",{"cwt_mean":{"scale":3}}]"#));
        let parsed: FeatureSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schema);
    }

    #[test]
    fn test_deserialize_rejects_bad_band() {
        let inverted = r#"{"name":"x","band_aggregation":"sum","features":[{"band_energy":{"low_hz":50.0,"high_hz":10.0}}]}"#;
        let err = serde_json::from_str::<FeatureSchema>(inverted).unwrap_err();
        assert!(err.to_string().contains("Invalid frequency band"));

        let negative = r#"{"name":"x","features":[{"band_energy":{"low_hz":-5.0,"high_hz":10.0}}]}"#;
        assert!(serde_json::from_str::<FeatureSchema>(negative).is_err());

        let plain = r#"{"name":"x","features":["mean"]}"#;
        let parsed: FeatureSchema = serde_json::from_str(plain).unwrap();
        assert_eq!(parsed.band_aggregation(), BandAggregation::Sum);
    }
}
