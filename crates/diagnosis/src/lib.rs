//! Pump Condition Monitoring
//!
//! Composes the waveform, analysis and classification crates into a single
//! [`DiagnosisPipeline`]: a sampled vibration or acoustic signal goes in, a
//! `FAULT` / `NO_FAULT` verdict with its intermediate representations comes out.

mod config;
mod error;
mod logging;
mod pipeline;
mod result;

pub use self::config::{
    AnalyzerToggles, ClassifierConfig, ConfigError, DiagnosisConfig, ScaleConfig, ENV_PREFIX,
};
pub use error::{DiagnosisError, ErrorKind};
pub use logging::{init_logging, LogFormat};
pub use pipeline::DiagnosisPipeline;
pub use result::{DiagnosisReport, DiagnosisResult};

pub use fallback::{Statistic, ThresholdClassifier};
pub use feature_engine::{
    BandAggregation, FeatureId, FeatureSchema, FeatureVector, Padding, WaveletKernel,
};
pub use inference_engine::{
    ClassLabels, DecisionFunction, FaultClassifier, FaultModel, ModelClassifier, ModelHandle,
    Normalizer, Verdict,
};
pub use waveform::{DelimitedSource, Layout, Signal, SyntheticSource, Tone, WaveformSource};
