//! Prediction service: Orchestrates normalization and model inference.
//!
//! This service coordinates:
//! - Feature normalization against the bundle's schema
//! - The fitted transform chain (imputer, scaler)
//! - Label and probability prediction with the selected model

use std::sync::Arc;

use crate::domain::{NormalizedRow, Prediction, RawRecord};
use crate::ports::ModelBundle;
use crate::CoviriskError;

use super::FeatureNormalizer;

/// Service for running risk prediction on raw records.
///
/// Holds a shared, read-only handle to the loaded bundle. Cloning the
/// service is cheap and clones share the same bundle.
#[derive(Debug, Clone)]
pub struct PredictionService {
    bundle: Arc<ModelBundle>,
    normalizer: Arc<FeatureNormalizer>,
    model_name: String,
}

impl PredictionService {
    /// Create a service using the bundle's default model.
    ///
    /// # Errors
    /// Returns error if the bundle has no models.
    pub fn new(bundle: Arc<ModelBundle>) -> Result<Self, CoviriskError> {
        let name = bundle
            .default_model_name()
            .ok_or_else(|| CoviriskError::ModelNotLoaded("bundle has no models".to_string()))?
            .to_string();
        Self::with_model(bundle, &name)
    }

    /// Create a service for a named model.
    ///
    /// # Errors
    /// Returns `CoviriskError::Model` if the name is unknown.
    pub fn with_model(bundle: Arc<ModelBundle>, model_name: &str) -> Result<Self, CoviriskError> {
        bundle.model(model_name)?;
        let normalizer = Arc::new(FeatureNormalizer::new(bundle.vocabulary.clone()));
        tracing::info!("Using model '{model_name}'");
        Ok(Self {
            bundle,
            normalizer,
            model_name: model_name.to_string(),
        })
    }

    /// Switch to another model in the same bundle.
    ///
    /// # Errors
    /// Returns `CoviriskError::Model` if the name is unknown.
    pub fn select_model(&mut self, model_name: &str) -> Result<(), CoviriskError> {
        self.bundle.model(model_name)?;
        self.model_name = model_name.to_string();
        tracing::info!("Switched to model '{model_name}'");
        Ok(())
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    #[must_use]
    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Normalize records without predicting.
    ///
    /// # Errors
    /// Returns `CoviriskError::Schema` on a degenerate schema.
    pub fn normalize(&self, records: &[RawRecord]) -> Result<Vec<NormalizedRow>, CoviriskError> {
        Ok(self.normalizer.normalize(records, &self.bundle.schema)?)
    }

    /// Run the full pipeline on a batch of records.
    ///
    /// 1. Normalize against the schema
    /// 2. Apply transforms in order
    /// 3. Predict labels, and probabilities if the model has them
    ///
    /// # Errors
    /// Returns error if the schema is degenerate or the model chain rejects
    /// the rows (e.g. NaN left without an imputer).
    pub fn predict(&self, records: &[RawRecord]) -> Result<Vec<Prediction>, CoviriskError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut matrix: Vec<Vec<f64>> = self
            .normalize(records)?
            .into_iter()
            .map(NormalizedRow::into_values)
            .collect();

        for transform in &self.bundle.transforms {
            tracing::trace!("Applying {}", transform.name());
            transform.transform(&mut matrix)?;
        }

        let model = self.bundle.model(&self.model_name)?;
        let labels = model.predict(&matrix)?;
        let probabilities = model.predict_proba(&matrix).transpose()?;

        let predictions: Vec<Prediction> = match probabilities {
            Some(proba) => labels
                .into_iter()
                .zip(proba)
                .map(|(label, [_, positive])| Prediction::new(label, Some(positive)))
                .collect(),
            None => labels
                .into_iter()
                .map(|label| Prediction::new(label, None))
                .collect(),
        };

        let positives = predictions
            .iter()
            .filter(|p| p.label == crate::domain::RiskLabel::Positive)
            .count();
        tracing::info!(
            "Prediction complete: model={}, rows={}, positive={}",
            self.model_name,
            predictions.len(),
            positives
        );

        Ok(predictions)
    }

    /// Predict a single record.
    ///
    /// # Errors
    /// See [`predict`](Self::predict).
    pub fn predict_one(&self, record: &RawRecord) -> Result<Prediction, CoviriskError> {
        self.predict(std::slice::from_ref(record))?
            .pop()
            .ok_or_else(|| CoviriskError::Validation("no prediction produced".to_string()))
    }
}
