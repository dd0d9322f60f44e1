//! Feature Normalization

use crate::InferenceError;
use serde::{Deserialize, Serialize};

/// Z-score normaliser with frozen training statistics
///
/// `z = (x - mean) / scale`. A zero scale (constant training feature) is treated as 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl Normalizer {
    /// Create a normaliser from per-feature mean and scale
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, InferenceError> {
        let normalizer = Self { mean, scale };
        normalizer.validate()?;
        Ok(normalizer)
    }

    /// Pass-through normaliser for `dimension` features
    pub fn identity(dimension: usize) -> Self {
        Self {
            mean: vec![0.0; dimension],
            scale: vec![1.0; dimension],
        }
    }

    /// Fit mean and population standard deviation column-wise over training rows
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, InferenceError> {
        let first = rows
            .first()
            .ok_or_else(|| InferenceError::InvalidModel("no training rows".to_string()))?;
        let dimension = first.len();
        if let Some(row) = rows.iter().find(|r| r.len() != dimension) {
            return Err(InferenceError::InvalidInputShape {
                expected: dimension,
                actual: row.len(),
            });
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; dimension];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v / n;
            }
        }
        let mut scale = vec![0.0; dimension];
        for row in rows {
            for ((s, v), m) in scale.iter_mut().zip(row).zip(&mean) {
                *s += (v - m) * (v - m) / n;
            }
        }
        scale.iter_mut().for_each(|s| *s = s.sqrt());

        Self::new(mean, scale)
    }

    /// Number of features handled
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Per-feature training mean
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Per-feature training scale
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Check lengths agree and every parameter is finite with non-negative scale
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.mean.len() != self.scale.len() {
            return Err(InferenceError::InvalidModel(format!(
                "normaliser has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(InferenceError::InvalidModel(
                "normaliser mean contains non-finite values".to_string(),
            ));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(InferenceError::InvalidModel(
                "normaliser scale must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Normalise one feature vector
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if values.len() != self.dimension() {
            return Err(InferenceError::InvalidInputShape {
                expected: self.dimension(),
                actual: values.len(),
            });
        }
        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| {
                let s = if *s == 0.0 { 1.0 } else { *s };
                (x - m) / s
            })
            .collect())
    }
}
