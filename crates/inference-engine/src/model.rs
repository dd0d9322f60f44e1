//! Trained Fault Model
//!
//! A model is inseparable from the normaliser and schema it was trained with, so
//! all three travel in one artifact. Artifacts are JSON (`.json`) or postcard
//! (any other extension).

use crate::classifier::Verdict;
use crate::normalizer::Normalizer;
use crate::InferenceError;
use feature_engine::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Artifact layout version understood by this build
pub const ARTIFACT_VERSION: u32 = 1;

/// Binary decision function over the normalised feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionFunction {
    /// score = w . z + b, probability = sigmoid(score)
    Linear { weights: Vec<f64>, bias: f64 },
    /// score = sum_i alpha_i * exp(-gamma * |sv_i - z|^2) + b
    RbfSvm {
        support_vectors: Vec<Vec<f64>>,
        dual_coef: Vec<f64>,
        intercept: f64,
        gamma: f64,
    },
}

impl DecisionFunction {
    /// Short identifier for logs
    pub fn kind(&self) -> &'static str {
        match self {
            DecisionFunction::Linear { .. } => "linear",
            DecisionFunction::RbfSvm { .. } => "rbf_svm",
        }
    }

    fn validate(&self, dimension: usize) -> Result<(), InferenceError> {
        match self {
            DecisionFunction::Linear { weights, bias } => {
                if weights.len() != dimension {
                    return Err(InferenceError::InvalidModel(format!(
                        "linear model has {} weights for {} features",
                        weights.len(),
                        dimension
                    )));
                }
                if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
                    return Err(InferenceError::InvalidModel(
                        "linear model parameters must be finite".to_string(),
                    ));
                }
            }
            DecisionFunction::RbfSvm {
                support_vectors,
                dual_coef,
                intercept,
                gamma,
            } => {
                if support_vectors.is_empty() {
                    return Err(InferenceError::InvalidModel(
                        "SVM has no support vectors".to_string(),
                    ));
                }
                if support_vectors.len() != dual_coef.len() {
                    return Err(InferenceError::InvalidModel(format!(
                        "SVM has {} support vectors but {} dual coefficients",
                        support_vectors.len(),
                        dual_coef.len()
                    )));
                }
                if let Some(sv) = support_vectors.iter().find(|sv| sv.len() != dimension) {
                    return Err(InferenceError::InvalidModel(format!(
                        "support vector of length {} for {} features",
                        sv.len(),
                        dimension
                    )));
                }
                if !(gamma.is_finite() && *gamma > 0.0) {
                    return Err(InferenceError::InvalidModel(format!(
                        "RBF gamma must be positive, got {gamma}"
                    )));
                }
                let finite = intercept.is_finite()
                    && dual_coef.iter().all(|a| a.is_finite())
                    && support_vectors.iter().flatten().all(|v| v.is_finite());
                if !finite {
                    return Err(InferenceError::InvalidModel(
                        "SVM parameters must be finite".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Decision value; positive selects the positive class
    pub fn score(&self, z: &[f64]) -> f64 {
        match self {
            DecisionFunction::Linear { weights, bias } => {
                weights.iter().zip(z).map(|(w, x)| w * x).sum::<f64>() + bias
            }
            DecisionFunction::RbfSvm {
                support_vectors,
                dual_coef,
                intercept,
                gamma,
            } => {
                support_vectors
                    .iter()
                    .zip(dual_coef)
                    .map(|(sv, alpha)| {
                        let dist2: f64 = sv.iter().zip(z).map(|(a, b)| (a - b) * (a - b)).sum();
                        alpha * (-gamma * dist2).exp()
                    })
                    .sum::<f64>()
                    + intercept
            }
        }
    }

    /// Positive-class probability, for decision functions that define one
    pub fn probability(&self, score: f64) -> Option<f64> {
        match self {
            DecisionFunction::Linear { .. } => Some(1.0 / (1.0 + (-score).exp())),
            DecisionFunction::RbfSvm { .. } => None,
        }
    }
}

/// Verdicts for the two sides of the decision boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassLabels {
    /// Verdict for a score <= 0
    pub negative: Verdict,
    /// Verdict for a score > 0
    pub positive: Verdict,
}

impl Default for ClassLabels {
    fn default() -> Self {
        Self {
            negative: Verdict::NoFault,
            positive: Verdict::Fault,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelArtifact {
    version: u32,
    schema: Arc<FeatureSchema>,
    normalizer: Normalizer,
    decision: DecisionFunction,
    labels: ClassLabels,
}

/// Schema, normaliser and decision function of one trained classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelArtifact", into = "ModelArtifact")]
pub struct FaultModel {
    schema: Arc<FeatureSchema>,
    normalizer: Normalizer,
    decision: DecisionFunction,
    labels: ClassLabels,
}

impl FaultModel {
    /// Assemble a model, checking every part agrees on the schema length
    pub fn new(
        schema: Arc<FeatureSchema>,
        normalizer: Normalizer,
        decision: DecisionFunction,
        labels: ClassLabels,
    ) -> Result<Self, InferenceError> {
        if schema.is_empty() {
            return Err(InferenceError::InvalidModel(format!(
                "schema '{}' has no features",
                schema.name()
            )));
        }
        normalizer.validate()?;
        if normalizer.dimension() != schema.len() {
            return Err(InferenceError::InvalidModel(format!(
                "normaliser covers {} features, schema '{}' has {}",
                normalizer.dimension(),
                schema.name(),
                schema.len()
            )));
        }
        decision.validate(schema.len())?;

        Ok(Self {
            schema,
            normalizer,
            decision,
            labels,
        })
    }

    /// Schema the model was trained on
    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    /// Training-time normaliser
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Decision function over normalised features
    pub fn decision(&self) -> &DecisionFunction {
        &self.decision
    }

    /// Verdicts on either side of the boundary
    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    /// Normalise raw feature values and evaluate the decision function
    ///
    /// Returns (verdict, score, probability).
    pub fn predict(&self, values: &[f64]) -> Result<(Verdict, f64, Option<f64>), InferenceError> {
        let z = self.normalizer.transform(values)?;
        let score = self.decision.score(&z);
        let verdict = if score > 0.0 {
            self.labels.positive.clone()
        } else {
            self.labels.negative.clone()
        };
        debug!(
            "Model decision: {} score={:.4} -> {}",
            self.decision.kind(),
            score,
            verdict
        );
        Ok((verdict, score, self.decision.probability(score)))
    }

    /// Parse a JSON artifact
    pub fn from_json(text: &str) -> Result<Self, InferenceError> {
        let artifact: ModelArtifact = serde_json::from_str(text)
            .map_err(|e| InferenceError::ModelLoadError(format!("malformed JSON artifact: {e}")))?;
        Self::try_from(artifact)
    }

    /// Parse a postcard artifact
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, InferenceError> {
        let artifact: ModelArtifact = postcard::from_bytes(bytes).map_err(|e| {
            InferenceError::ModelLoadError(format!("malformed binary artifact: {e}"))
        })?;
        Self::try_from(artifact)
    }

    /// Encode as a JSON artifact
    pub fn to_json(&self) -> Result<String, InferenceError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| InferenceError::ModelLoadError(format!("JSON encoding failed: {e}")))
    }

    /// Encode as a postcard artifact
    pub fn to_postcard(&self) -> Result<Vec<u8>, InferenceError> {
        postcard::to_allocvec(self)
            .map_err(|e| InferenceError::ModelLoadError(format!("binary encoding failed: {e}")))
    }

    /// Load an artifact, choosing the format by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {e}", path.display())))?;

        let model = if is_json(path) {
            let text = std::str::from_utf8(&bytes).map_err(|e| {
                InferenceError::ModelLoadError(format!("{}: {e}", path.display()))
            })?;
            Self::from_json(text)?
        } else {
            Self::from_postcard(&bytes)?
        };

        info!(
            "Loaded {} model from {} (schema '{}', {} features)",
            model.decision.kind(),
            path.display(),
            model.schema.name(),
            model.schema.len()
        );
        Ok(model)
    }

    /// Write an artifact, choosing the format by extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), InferenceError> {
        let path = path.as_ref();
        let bytes = if is_json(path) {
            self.to_json()?.into_bytes()
        } else {
            self.to_postcard()?
        };
        std::fs::write(path, bytes)
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {e}", path.display())))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

impl TryFrom<ModelArtifact> for FaultModel {
    type Error = InferenceError;

    fn try_from(artifact: ModelArtifact) -> Result<Self, Self::Error> {
        if artifact.version != ARTIFACT_VERSION {
            return Err(InferenceError::InvalidModel(format!(
                "artifact version {} is not supported (expected {})",
                artifact.version, ARTIFACT_VERSION
            )));
        }
        Self::new(
            artifact.schema,
            artifact.normalizer,
            artifact.decision,
            artifact.labels,
        )
    }
}

impl From<FaultModel> for ModelArtifact {
    fn from(model: FaultModel) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            schema: model.schema,
            normalizer: model.normalizer,
            decision: model.decision,
            labels: model.labels,
        }
    }
}
