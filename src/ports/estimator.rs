//! Estimator port: Traits for the trained preprocessing + model chain.
//!
//! These traits abstract the loaded model artifact from the application
//! logic. Rows reaching them are already aligned to the target schema.

use std::collections::BTreeMap;

use crate::domain::{TargetSchema, Vocabulary};

/// Errors raised by the model chain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Non-finite input in column {column}; impute missing values before prediction")]
    NonFiniteInput { column: usize },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Invalid model parameters: {0}")]
    InvalidParameters(String),
}

/// Check every row has `width` finite values.
///
/// # Errors
/// Returns the first dimension or finiteness violation found.
pub fn check_rows(rows: &[Vec<f64>], width: usize) -> Result<(), ModelError> {
    for row in rows {
        if row.len() != width {
            return Err(ModelError::DimensionMismatch {
                expected: width,
                got: row.len(),
            });
        }
        if let Some(column) = row.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteInput { column });
        }
    }
    Ok(())
}

/// A fitted column-wise transform (imputer, scaler).
pub trait FeatureTransform: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Transform rows in place.
    ///
    /// # Errors
    /// Returns `ModelError::DimensionMismatch` if a row has the wrong width.
    fn transform(&self, rows: &mut [Vec<f64>]) -> Result<(), ModelError>;
}

/// A fitted binary classifier.
///
/// Implementations must be pure: predicting one batch never affects the
/// next, so a single instance can serve concurrent callers.
pub trait Estimator: Send + Sync {
    /// Number of input features.
    fn n_features(&self) -> usize;

    /// Predict class labels (0 = negative, 1 = positive).
    ///
    /// # Errors
    /// Returns `ModelError` on dimension or finiteness violations.
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<u8>, ModelError>;

    /// Per-row `[p_negative, p_positive]`, if the model supports it.
    ///
    /// Returns `None` for models without probability output.
    fn predict_proba(&self, _rows: &[Vec<f64>]) -> Option<Result<Vec<[f64; 2]>, ModelError>> {
        None
    }
}

/// A loaded model artifact: schema, vocabulary, transforms, named models.
///
/// Built once at startup and shared by reference (`Arc`). Never mutated
/// after construction.
pub struct ModelBundle {
    pub schema: TargetSchema,
    pub vocabulary: Vocabulary,
    /// Applied in order after normalization (e.g. imputer then scaler)
    pub transforms: Vec<Box<dyn FeatureTransform>>,
    pub models: BTreeMap<String, Box<dyn Estimator>>,
}

impl ModelBundle {
    /// Model names, sorted.
    #[must_use]
    pub fn model_names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    /// Look up a model by name.
    ///
    /// # Errors
    /// Returns `ModelError::UnknownModel` if no model has that name.
    pub fn model(&self, name: &str) -> Result<&dyn Estimator, ModelError> {
        self.models
            .get(name)
            .map(|m| &**m)
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    /// Name of the model used when none is selected (first by name).
    #[must_use]
    pub fn default_model_name(&self) -> Option<&str> {
        self.models.keys().next().map(String::as_str)
    }
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("n_features", &self.schema.len())
            .field(
                "transforms",
                &self.transforms.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("models", &self.model_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_rows() {
        assert!(check_rows(&[vec![1.0, 2.0]], 2).is_ok());
        assert_eq!(
            check_rows(&[vec![1.0]], 2),
            Err(ModelError::DimensionMismatch { expected: 2, got: 1 })
        );
        assert_eq!(
            check_rows(&[vec![1.0, f64::NAN]], 2),
            Err(ModelError::NonFiniteInput { column: 1 })
        );
    }
}
