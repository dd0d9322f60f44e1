//! Threshold Rule

use feature_engine::{FeatureSchema, TimeDomainSummary};
use inference_engine::{ClassifierInput, Decision, FaultClassifier, InferenceError, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Threshold applied to the signal mean by default
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Summary statistic a threshold rule reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    #[default]
    Mean,
    MeanAbs,
    #[serde(rename = "std")]
    StdDev,
    Rms,
    PeakToPeak,
    Energy,
    Kurtosis,
    Skewness,
    CrestFactor,
}

impl Statistic {
    /// Read the statistic from a summary
    pub fn value(&self, summary: &TimeDomainSummary) -> f64 {
        match self {
            Statistic::Mean => summary.mean,
            Statistic::MeanAbs => summary.mean_abs,
            Statistic::StdDev => summary.std_dev,
            Statistic::Rms => summary.rms,
            Statistic::PeakToPeak => summary.peak_to_peak,
            Statistic::Energy => summary.energy,
            Statistic::Kurtosis => summary.kurtosis,
            Statistic::Skewness => summary.skewness,
            Statistic::CrestFactor => summary.crest_factor,
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Statistic::Mean => "mean",
            Statistic::MeanAbs => "mean_abs",
            Statistic::StdDev => "std",
            Statistic::Rms => "rms",
            Statistic::PeakToPeak => "peak_to_peak",
            Statistic::Energy => "energy",
            Statistic::Kurtosis => "kurtosis",
            Statistic::Skewness => "skewness",
            Statistic::CrestFactor => "crest_factor",
        };
        f.write_str(name)
    }
}

/// `FAULT` iff the chosen statistic is strictly greater than the threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdClassifier {
    statistic: Statistic,
    threshold: f64,
}

impl Default for ThresholdClassifier {
    fn default() -> Self {
        Self {
            statistic: Statistic::Mean,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ThresholdClassifier {
    /// Name recorded in every decision
    pub const NAME: &'static str = "threshold";

    /// Rule on `statistic > threshold`; the threshold must be finite
    pub fn new(statistic: Statistic, threshold: f64) -> Result<Self, InferenceError> {
        if !threshold.is_finite() {
            return Err(InferenceError::InvalidModel(format!(
                "threshold must be finite, got {threshold}"
            )));
        }
        Ok(Self {
            statistic,
            threshold,
        })
    }

    /// Statistic the rule reads
    pub fn statistic(&self) -> Statistic {
        self.statistic
    }

    /// Decision threshold (strict)
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Apply the rule to a summary
    pub fn decide(&self, summary: &TimeDomainSummary) -> Decision {
        let value = self.statistic.value(summary);
        let verdict = if value > self.threshold {
            Verdict::Fault
        } else {
            Verdict::NoFault
        };

        debug!(
            "Threshold rule: {}={:.6} vs {} -> {}",
            self.statistic, value, self.threshold, verdict
        );

        Decision {
            verdict,
            score: Some(value),
            probability: None,
            classifier: Self::NAME.to_string(),
        }
    }
}

impl FaultClassifier for ThresholdClassifier {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn feature_schema(&self) -> Result<Option<Arc<FeatureSchema>>, InferenceError> {
        Ok(None)
    }

    fn classify(&self, input: &ClassifierInput<'_>) -> Result<Decision, InferenceError> {
        Ok(self.decide(input.summary))
    }

    fn snapshot(&self) -> Result<Arc<dyn FaultClassifier>, InferenceError> {
        Ok(Arc::new(*self))
    }
}
