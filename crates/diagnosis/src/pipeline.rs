//! Diagnosis Pipeline
//!
//! Thin forward composition: analyzers, then feature extraction when the classifier
//! consumes a feature vector, then classification. Component errors propagate as-is.

use crate::config::{ClassifierConfig, DiagnosisConfig};
use crate::error::DiagnosisError;
use crate::result::DiagnosisResult;
use fallback::ThresholdClassifier;
use feature_engine::{
    validate_scales, FeatureExtractor, FeatureSchema, FeatureVector, SpectralAnalyzer, Spectrum,
    TimeDomainAnalyzer, TimeFrequencyAnalyzer, TimeFrequencyMap,
};
use inference_engine::{ClassifierInput, FaultClassifier, ModelClassifier, ModelHandle};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;
use waveform::Signal;

/// Configured analyzers and classifier, shareable across threads
pub struct DiagnosisPipeline {
    config: DiagnosisConfig,
    scales: Vec<u32>,
    time_domain: TimeDomainAnalyzer,
    spectral: SpectralAnalyzer,
    time_frequency: TimeFrequencyAnalyzer,
    classifier: Arc<dyn FaultClassifier>,
    model_handle: Option<ModelHandle>,
    dataset_schema: Arc<FeatureSchema>,
}

impl DiagnosisPipeline {
    /// Build the pipeline and the classifier named by the configuration
    ///
    /// A `model` classifier loads its artifact here; load failures are returned.
    pub fn new(config: DiagnosisConfig) -> Result<Self, DiagnosisError> {
        let (classifier, model_handle): (Arc<dyn FaultClassifier>, Option<ModelHandle>) =
            match &config.classifier {
                ClassifierConfig::Threshold {
                    statistic,
                    threshold,
                } => (
                    Arc::new(ThresholdClassifier::new(*statistic, *threshold)?),
                    None,
                ),
                ClassifierConfig::Model { path } => {
                    let handle = ModelHandle::new();
                    handle.reload(path)?;
                    (
                        Arc::new(ModelClassifier::new(handle.clone())),
                        Some(handle),
                    )
                }
            };

        let mut pipeline = Self::with_classifier(config, classifier)?;
        pipeline.model_handle = model_handle;
        Ok(pipeline)
    }

    /// Build the pipeline around an externally supplied classifier
    pub fn with_classifier(
        config: DiagnosisConfig,
        classifier: Arc<dyn FaultClassifier>,
    ) -> Result<Self, DiagnosisError> {
        config.validate()?;
        let scales = config.resolved_scales()?;
        if config.analyzers.time_frequency {
            validate_scales(&scales)?;
        }
        let dataset_schema = Arc::new(config.vibration_schema()?);

        info!(
            "Diagnosis pipeline ready: classifier={}, spectrum={}, time_frequency={} ({} scales, {})",
            classifier.name(),
            config.analyzers.spectrum,
            config.analyzers.time_frequency,
            scales.len(),
            config.wavelet_kernel.name()
        );

        Ok(Self {
            time_frequency: TimeFrequencyAnalyzer::new(config.padding),
            config,
            scales,
            time_domain: TimeDomainAnalyzer::new(),
            spectral: SpectralAnalyzer::new(),
            classifier,
            model_handle: None,
            dataset_schema,
        })
    }

    /// Configuration the pipeline was built from
    pub fn config(&self) -> &DiagnosisConfig {
        &self.config
    }

    /// Configured classifier
    pub fn classifier(&self) -> &Arc<dyn FaultClassifier> {
        &self.classifier
    }

    /// Handle for hot-swapping the model, when the configured classifier is `model`
    pub fn model_handle(&self) -> Option<&ModelHandle> {
        self.model_handle.as_ref()
    }

    /// Schema used by [`extract_features`](Self::extract_features)
    pub fn dataset_schema(&self) -> &Arc<FeatureSchema> {
        &self.dataset_schema
    }

    /// Diagnose one signal
    pub fn diagnose(&self, signal: &Signal) -> Result<DiagnosisResult, DiagnosisError> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "diagnose",
            %request_id,
            classifier = self.classifier.name(),
            samples = signal.len()
        );
        let _guard = span.enter();
        let started = Instant::now();

        let outcome = self.run(request_id, signal);
        let elapsed = started.elapsed().as_secs_f64();

        match &outcome {
            Ok(result) => {
                counter!("diagnosis_requests_total", "verdict" => result.verdict.to_string())
                    .increment(1);
                histogram!("diagnosis_duration_seconds").record(elapsed);
                info!(
                    "Verdict {} from {} in {:.1} ms",
                    result.verdict,
                    result.classifier,
                    elapsed * 1000.0
                );
            }
            Err(e) => {
                counter!("diagnosis_failures_total", "kind" => e.kind().as_str()).increment(1);
                warn!("Diagnosis failed ({}): {}", e.kind(), e);
            }
        }
        outcome
    }

    fn run(&self, request_id: Uuid, signal: &Signal) -> Result<DiagnosisResult, DiagnosisError> {
        self.config.check_sample_rate(signal.sample_rate())?;

        let summary = self.time_domain.summarize(signal)?;
        let (spectrum, time_frequency) = self.representations(signal)?;

        // One snapshot serves both the schema lookup and the decision
        let classifier = self.classifier.snapshot()?;
        let features = match classifier.feature_schema()? {
            Some(schema) => {
                let vector = FeatureExtractor::new(schema).extract(
                    &summary,
                    spectrum.as_ref(),
                    time_frequency.as_ref(),
                )?;
                Some(vector)
            }
            None => {
                debug!("Classifier reads the summary directly, skipping feature extraction");
                None
            }
        };

        let decision = classifier.classify(&ClassifierInput::new(&summary, features.as_ref()))?;

        Ok(DiagnosisResult::new(
            request_id,
            decision,
            summary,
            spectrum,
            time_frequency,
            features,
        ))
    }

    fn representations(
        &self,
        signal: &Signal,
    ) -> Result<(Option<Spectrum>, Option<TimeFrequencyMap>), DiagnosisError> {
        let spectrum = if self.config.analyzers.spectrum {
            Some(self.spectral.transform(signal)?)
        } else {
            None
        };
        let time_frequency = if self.config.analyzers.time_frequency {
            Some(
                self.time_frequency
                    .decompose(signal, &self.scales, &self.config.wavelet_kernel)?,
            )
        } else {
            None
        };
        Ok((spectrum, time_frequency))
    }

    /// Feature vector under the configured vibration schema, independent of the classifier
    pub fn extract_features(&self, signal: &Signal) -> Result<FeatureVector, DiagnosisError> {
        self.config.check_sample_rate(signal.sample_rate())?;
        let summary = self.time_domain.summarize(signal)?;
        let (spectrum, time_frequency) = self.representations(signal)?;
        Ok(FeatureExtractor::new(Arc::clone(&self.dataset_schema)).extract(
            &summary,
            spectrum.as_ref(),
            time_frequency.as_ref(),
        )?)
    }
}
