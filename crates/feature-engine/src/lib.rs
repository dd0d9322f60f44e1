//! Feature Engineering Engine
//!
//! Time-domain statistics, the one-sided FFT spectrum, the continuous wavelet
//! transform and schema-driven feature vector assembly.

mod cwt;
mod error;
mod features;
mod fft;
mod schema;
mod statistics;

pub use cwt::{
    default_scales, validate_scales, Padding, TimeFrequencyAnalyzer, TimeFrequencyMap,
    WaveletKernel, DEFAULT_MAX_SCALE, KERNEL_SUPPORT, MAX_SCALE,
};
pub use error::AnalysisError;
pub use features::{FeatureExtractor, FeatureVector};
pub use fft::{SpectralAnalyzer, Spectrum};
pub use schema::{bands_from_edges, BandAggregation, FeatureId, FeatureSchema, Requirement};
pub use statistics::{TimeDomainAnalyzer, TimeDomainSummary};
