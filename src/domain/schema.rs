//! Target schema and normalized feature rows.
//!
//! The schema is the ordered column list a trained pipeline was fit on.
//! It is loaded once with the model artifact and shared read-only.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Columns that are imputed downstream when the raw record lacks them.
pub const DEFAULT_CONTINUOUS_FEATURES: [&str; 2] = ["age", "delay_days"];

/// Errors raised while normalizing against a schema.
///
/// Only configuration problems surface here. Per-record data problems are
/// absorbed by the fill/default policies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}

/// Ordered feature-column names expected by a trained model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "SchemaSpec", into = "SchemaSpec")]
pub struct TargetSchema {
    columns: Arc<[String]>,
    index: HashMap<String, usize>,
    continuous: HashSet<String>,
}

#[derive(Serialize, Deserialize)]
struct SchemaSpec {
    feature_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    continuous_features: Option<Vec<String>>,
}

impl From<SchemaSpec> for TargetSchema {
    fn from(spec: SchemaSpec) -> Self {
        match spec.continuous_features {
            Some(continuous) => Self::with_continuous(spec.feature_names, continuous),
            None => Self::new(spec.feature_names),
        }
    }
}

impl From<TargetSchema> for SchemaSpec {
    fn from(schema: TargetSchema) -> Self {
        let mut continuous: Vec<String> = schema
            .columns
            .iter()
            .filter(|c| schema.continuous.contains(*c))
            .cloned()
            .collect();
        continuous.dedup();
        Self {
            feature_names: schema.columns.to_vec(),
            continuous_features: Some(continuous),
        }
    }
}

impl TargetSchema {
    /// Build a schema with the default continuous columns (`age`, `delay_days`).
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_continuous(columns, DEFAULT_CONTINUOUS_FEATURES)
    }

    /// Build a schema with an explicit set of continuous columns.
    ///
    /// Continuous columns are filled with NaN when absent from a record so a
    /// downstream imputer can act on them; every other absent column is 0.
    #[must_use]
    pub fn with_continuous<I, S, C, T>(columns: I, continuous: C) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        C: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let columns: Arc<[String]> = columns.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(columns.len());
        for (pos, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(pos);
        }
        Self {
            columns,
            index,
            continuous: continuous.into_iter().map(Into::into).collect(),
        }
    }

    /// Check that the schema can drive alignment.
    ///
    /// # Errors
    /// Returns `NormalizeError::SchemaMismatch` if the schema is empty or
    /// names a column more than once.
    pub fn validate(&self) -> Result<(), NormalizeError> {
        if self.columns.is_empty() {
            return Err(NormalizeError::SchemaMismatch(
                "target schema has no feature columns".to_string(),
            ));
        }
        if self.index.len() != self.columns.len() {
            let mut seen = HashSet::new();
            let dup = self
                .columns
                .iter()
                .find(|c| !seen.insert(c.as_str()))
                .cloned()
                .unwrap_or_default();
            return Err(NormalizeError::SchemaMismatch(format!(
                "target schema lists column '{dup}' more than once"
            )));
        }
        Ok(())
    }

    /// Column names in model order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column, if the schema has it.
    #[must_use]
    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Whether an absent value in this column means "missing, impute later".
    #[must_use]
    pub fn is_continuous(&self, column: &str) -> bool {
        self.continuous.contains(column)
    }
}

/// One model-ready feature vector, in `TargetSchema` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    values: Vec<f64>,
}

impl NormalizedRow {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column.
    #[must_use]
    pub fn get(&self, schema: &TargetSchema, column: &str) -> Option<f64> {
        schema.position(column).and_then(|i| self.values.get(i).copied())
    }

    #[must_use]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}
