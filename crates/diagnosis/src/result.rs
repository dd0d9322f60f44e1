//! Diagnosis Results

use chrono::{DateTime, Utc};
use feature_engine::{FeatureVector, Spectrum, TimeDomainSummary, TimeFrequencyMap};
use inference_engine::{Decision, Verdict};
use serde::Serialize;
use uuid::Uuid;

/// Verdict plus every intermediate representation of one diagnosis
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisResult {
    /// Identifier shared with the request's log span
    pub request_id: Uuid,
    /// Completion time
    pub timestamp: DateTime<Utc>,
    /// Diagnostic outcome
    pub verdict: Verdict,
    /// Decision value (statistic or decision function)
    pub score: Option<f64>,
    /// Positive-class probability, when defined
    pub probability: Option<f64>,
    /// Classifier that produced the verdict
    pub classifier: String,
    /// Time-domain summary, including the waveform trace
    pub summary: TimeDomainSummary,
    /// One-sided spectrum, when enabled
    pub spectrum: Option<Spectrum>,
    /// CWT magnitude map, when enabled
    pub time_frequency: Option<TimeFrequencyMap>,
    /// Present only when the classifier consumed a feature vector
    pub features: Option<FeatureVector>,
}

impl DiagnosisResult {
    pub(crate) fn new(
        request_id: Uuid,
        decision: Decision,
        summary: TimeDomainSummary,
        spectrum: Option<Spectrum>,
        time_frequency: Option<TimeFrequencyMap>,
        features: Option<FeatureVector>,
    ) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
            verdict: decision.verdict,
            score: decision.score,
            probability: decision.probability,
            classifier: decision.classifier,
            summary,
            spectrum,
            time_frequency,
            features,
        }
    }

    /// Anything other than `NO_FAULT`
    pub fn is_fault(&self) -> bool {
        self.verdict.is_fault()
    }

    /// Compact view without sample arrays
    pub fn report(&self) -> DiagnosisReport {
        DiagnosisReport {
            request_id: self.request_id,
            timestamp: self.timestamp,
            label: self.summary.signal.label().map(str::to_string),
            verdict: self.verdict.clone(),
            score: self.score,
            probability: self.probability,
            classifier: self.classifier.clone(),
            num_samples: self.summary.signal.len(),
            sample_rate: self.summary.signal.sample_rate(),
            mean: self.summary.mean,
            std_dev: self.summary.std_dev,
            skewness: self.summary.skewness,
            kurtosis: self.summary.kurtosis,
            rms: self.summary.rms,
            dominant_frequency_hz: self
                .spectrum
                .as_ref()
                .and_then(|s| s.peak())
                .map(|(f, _)| f),
            features: self.features.as_ref().map(FeatureVector::named),
        }
    }
}

/// Summary of a [`DiagnosisResult`] suitable for printing
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisReport {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub label: Option<String>,
    pub verdict: Verdict,
    pub score: Option<f64>,
    pub probability: Option<f64>,
    pub classifier: String,
    pub num_samples: usize,
    pub sample_rate: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub rms: f64,
    pub dominant_frequency_hz: Option<f64>,
    pub features: Option<Vec<(String, f64)>>,
}
