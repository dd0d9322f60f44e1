//! Fault Classifier Capability

use crate::InferenceError;
use feature_engine::{FeatureSchema, FeatureVector, TimeDomainSummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Diagnostic verdict
///
/// Serialised as a plain string: `"NO_FAULT"`, `"FAULT"`, or the class label itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    /// Healthy
    NoFault,
    /// Faulty, without a named class
    Fault,
    /// Named class from a multi-label model
    Class(String),
}

impl Verdict {
    /// Wire string of the verdict
    pub fn as_str(&self) -> &str {
        match self {
            Verdict::NoFault => "NO_FAULT",
            Verdict::Fault => "FAULT",
            Verdict::Class(label) => label,
        }
    }

    /// Anything other than `NO_FAULT`
    pub fn is_fault(&self) -> bool {
        !matches!(self, Verdict::NoFault)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Verdict {
    fn from(label: String) -> Self {
        match label.as_str() {
            "NO_FAULT" => Verdict::NoFault,
            "FAULT" => Verdict::Fault,
            _ => Verdict::Class(label),
        }
    }
}

impl From<Verdict> for String {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Class(label) => label,
            other => other.as_str().to_string(),
        }
    }
}

/// Outcome of one classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Diagnostic outcome
    pub verdict: Verdict,
    /// Raw decision value (statistic for rules, decision function for models)
    pub score: Option<f64>,
    /// Probability of the positive class, when the decision function provides one
    pub probability: Option<f64>,
    /// Name of the classifier that decided
    pub classifier: String,
}

/// Everything a classifier may read
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput<'a> {
    /// Time-domain statistics, always present
    pub summary: &'a TimeDomainSummary,
    /// Feature vector, when the classifier declares a schema
    pub features: Option<&'a FeatureVector>,
}

impl<'a> ClassifierInput<'a> {
    /// Bundle a summary with an optional feature vector
    pub fn new(summary: &'a TimeDomainSummary, features: Option<&'a FeatureVector>) -> Self {
        Self { summary, features }
    }
}

/// Pluggable decision component
///
/// Implementations are shared across threads by the pipeline, so they hold no
/// per-call mutable state.
pub trait FaultClassifier: Send + Sync {
    /// Short identifier recorded in every [`Decision`]
    fn name(&self) -> &'static str;

    /// Schema the classifier consumes, or `None` if it reads the summary directly
    ///
    /// Returns [`InferenceError::ModelUnavailable`] when the schema lives in a model
    /// that has not been loaded.
    fn feature_schema(&self) -> Result<Option<Arc<FeatureSchema>>, InferenceError>;

    /// Decide on one input
    fn classify(&self, input: &ClassifierInput<'_>) -> Result<Decision, InferenceError>;

    /// Classifier with its state fixed for one request
    ///
    /// Schema lookup and decision made through the returned value always see the same
    /// state, even if the underlying classifier is updated in between.
    fn snapshot(&self) -> Result<Arc<dyn FaultClassifier>, InferenceError>;
}
