//! Rule-Based Fallback Classifier
//!
//! Decides on a single time-domain statistic compared against a fixed threshold.
//! Needs no feature vector and no trained model.

mod rules;

pub use rules::{Statistic, ThresholdClassifier, DEFAULT_THRESHOLD};
