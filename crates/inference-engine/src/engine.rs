//! Model-Backed Classifier

use crate::classifier::{ClassifierInput, Decision, FaultClassifier};
use crate::model::FaultModel;
use crate::InferenceError;
use feature_engine::{FeatureSchema, FeatureVector};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared slot holding the currently published model
///
/// Cloning the handle shares the slot. Readers take an `Arc` snapshot, so a model
/// swapped in mid-request never affects a classification already under way.
#[derive(Debug, Clone, Default)]
pub struct ModelHandle {
    slot: Arc<RwLock<Option<Arc<FaultModel>>>>,
}

impl ModelHandle {
    /// Empty handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle already holding a model
    pub fn with_model(model: FaultModel) -> Self {
        let handle = Self::new();
        handle.publish(model);
        handle
    }

    /// Replace the current model
    pub fn publish(&self, model: FaultModel) {
        info!(
            "Publishing {} model for schema '{}'",
            model.decision().kind(),
            model.schema().name()
        );
        *self.slot.write() = Some(Arc::new(model));
    }

    /// Load an artifact from disk and publish it; the old model stays on failure
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<(), InferenceError> {
        match FaultModel::load(path.as_ref()) {
            Ok(model) => {
                self.publish(model);
                Ok(())
            }
            Err(e) => {
                warn!("Model reload from {} failed: {}", path.as_ref().display(), e);
                Err(e)
            }
        }
    }

    /// Remove the current model
    pub fn clear(&self) {
        info!("Clearing published model");
        *self.slot.write() = None;
    }

    /// Snapshot of the current model
    pub fn current(&self) -> Option<Arc<FaultModel>> {
        self.slot.read().clone()
    }

    /// True while a model is published
    pub fn is_loaded(&self) -> bool {
        self.slot.read().is_some()
    }
}

/// Classifier delegating to a trained [`FaultModel`]
#[derive(Debug, Clone, Default)]
pub struct ModelClassifier {
    handle: ModelHandle,
}

impl ModelClassifier {
    /// Name recorded in every decision
    pub const NAME: &'static str = "model";

    /// Classifier reading from a shared handle
    pub fn new(handle: ModelHandle) -> Self {
        Self { handle }
    }

    /// Handle used for publication and reload
    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    fn current_model(&self) -> Result<Arc<FaultModel>, InferenceError> {
        self.handle.current().ok_or(InferenceError::ModelUnavailable)
    }

    /// Classify a feature vector against the currently published model
    pub fn classify_vector(&self, vector: &FeatureVector) -> Result<Decision, InferenceError> {
        let model = self.current_model()?;
        Self::classify_with(&model, vector)
    }

    /// Classify a feature vector against one given model
    pub fn classify_with(model: &FaultModel, vector: &FeatureVector) -> Result<Decision, InferenceError> {
        if vector.schema().as_ref() != model.schema().as_ref() {
            return Err(InferenceError::SchemaMismatch {
                expected: describe(model.schema()),
                actual: describe(vector.schema()),
            });
        }

        let (verdict, score, probability) = model.predict(vector.values())?;
        debug!("Model classifier verdict: {}", verdict);

        Ok(Decision {
            verdict,
            score: Some(score),
            probability,
            classifier: Self::NAME.to_string(),
        })
    }
}

fn describe(schema: &FeatureSchema) -> String {
    let names = schema.feature_names();
    format!("{} ({} features: {})", schema.name(), names.len(), names.join(", "))
}

fn require_features<'a>(input: &ClassifierInput<'a>) -> Result<&'a FeatureVector, InferenceError> {
    input
        .features
        .ok_or_else(|| InferenceError::MissingFeatures(ModelClassifier::NAME.to_string()))
}

impl FaultClassifier for ModelClassifier {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn feature_schema(&self) -> Result<Option<Arc<FeatureSchema>>, InferenceError> {
        Ok(Some(Arc::clone(self.current_model()?.schema())))
    }

    fn classify(&self, input: &ClassifierInput<'_>) -> Result<Decision, InferenceError> {
        self.classify_vector(require_features(input)?)
    }

    fn snapshot(&self) -> Result<Arc<dyn FaultClassifier>, InferenceError> {
        Ok(Arc::new(ModelSnapshot::new(self.current_model()?)))
    }
}

/// One published model, pinned for the duration of a request
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    model: Arc<FaultModel>,
}

impl ModelSnapshot {
    /// Pin a model
    pub fn new(model: Arc<FaultModel>) -> Self {
        Self { model }
    }

    /// The pinned model
    pub fn model(&self) -> &Arc<FaultModel> {
        &self.model
    }
}

impl FaultClassifier for ModelSnapshot {
    fn name(&self) -> &'static str {
        ModelClassifier::NAME
    }

    fn feature_schema(&self) -> Result<Option<Arc<FeatureSchema>>, InferenceError> {
        Ok(Some(Arc::clone(self.model.schema())))
    }

    fn classify(&self, input: &ClassifierInput<'_>) -> Result<Decision, InferenceError> {
        ModelClassifier::classify_with(&self.model, require_features(input)?)
    }

    fn snapshot(&self) -> Result<Arc<dyn FaultClassifier>, InferenceError> {
        Ok(Arc::new(self.clone()))
    }
}
