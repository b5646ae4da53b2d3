//! Model artifact adapter: loads the exported preprocessing + model bundle.
//!
//! The artifact is a JSON document written by the training notebook:
//!
//! ```json
//! {
//!   "feature_names": ["age", "delay_days", "gender_Male", "..."],
//!   "continuous_features": ["age", "delay_days"],
//!   "imputer": { "strategy": "mean", "statistics": [ ... ] },
//!   "scaler": { "mean": [ ... ], "scale": [ ... ] },
//!   "models": { "Logistic Regression": { "kind": "logistic", ... } }
//! }
//! ```
//!
//! # Integrity
//!
//! A `manifest.json` next to the artifact may bind SHA-256 digests of the
//! artifact files. When present every listed digest must match. When
//! `require_manifest` is set, a missing manifest is an error.

mod estimators;
mod transforms;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::domain::{NormalizeError, TargetSchema, Vocabulary};
use crate::ports::{FeatureTransform, ModelBundle, ModelError};

pub use estimators::{DecisionTree, LinearSvc, LogisticRegression, ModelSpec};
pub use transforms::{SimpleImputer, StandardScaler};

const MANIFEST_FILE: &str = "manifest.json";

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid artifact format: {0}")]
    Format(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] NormalizeError),

    #[error("Model '{name}': {source}")]
    Model { name: String, source: ModelError },

    #[error("Artifact has no models")]
    NoModels,

    #[error("Integrity check failed: {0}")]
    Integrity(String),
}

#[derive(Debug, Deserialize)]
struct ArtifactFile {
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    #[serde(default)]
    continuous_features: Option<Vec<String>>,
    #[serde(default)]
    vocabulary: Option<Vocabulary>,
    #[serde(default)]
    imputer: Option<SimpleImputer>,
    #[serde(default)]
    scaler: Option<StandardScaler>,
    #[serde(default)]
    models: BTreeMap<String, ModelSpec>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    version: u32,
    files: BTreeMap<String, String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{b:02x}")).collect()
}

fn read(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a [`ModelBundle`] from disk.
#[derive(Debug, Clone, Default)]
pub struct ArtifactLoader {
    require_manifest: bool,
}

impl ArtifactLoader {
    #[must_use]
    pub fn new(require_manifest: bool) -> Self {
        Self { require_manifest }
    }

    /// Load and validate an artifact.
    ///
    /// # Errors
    /// Returns `ArtifactError::Schema` when `feature_names` is missing or
    /// degenerate, and other variants for I/O, format, integrity or model
    /// parameter problems.
    pub fn load(&self, path: &Path) -> Result<ModelBundle, ArtifactError> {
        let bytes = read(path)?;
        self.verify_manifest(path, &bytes)?;
        let bundle = Self::from_slice(&bytes)?;

        tracing::info!(
            "Loaded artifact from {:?} (n_features={}, transforms={}, models={:?})",
            path,
            bundle.schema.len(),
            bundle.transforms.len(),
            bundle.model_names()
        );
        Ok(bundle)
    }

    /// Build a bundle from artifact JSON.
    ///
    /// # Errors
    /// See [`load`](Self::load).
    pub fn from_slice(bytes: &[u8]) -> Result<ModelBundle, ArtifactError> {
        let file: ArtifactFile = serde_json::from_slice(bytes)?;

        let feature_names = file.feature_names.ok_or_else(|| {
            NormalizeError::SchemaMismatch("artifact does not carry feature_names".to_string())
        })?;
        let schema = match file.continuous_features {
            Some(continuous) => TargetSchema::with_continuous(feature_names, continuous),
            None => TargetSchema::new(feature_names),
        };
        schema.validate()?;
        let n = schema.len();

        let mut transforms: Vec<Box<dyn FeatureTransform>> = Vec::new();
        if let Some(imputer) = file.imputer {
            if imputer.statistics.len() != n {
                return Err(ArtifactError::Integrity(format!(
                    "imputer has {} statistics for {n} features",
                    imputer.statistics.len()
                )));
            }
            transforms.push(Box::new(imputer));
        }
        if let Some(scaler) = file.scaler {
            scaler.validate().map_err(|source| ArtifactError::Model {
                name: "scaler".to_string(),
                source,
            })?;
            if scaler.mean.len() != n {
                return Err(ArtifactError::Integrity(format!(
                    "scaler has {} columns for {n} features",
                    scaler.mean.len()
                )));
            }
            transforms.push(Box::new(scaler));
        }

        if file.models.is_empty() {
            return Err(ArtifactError::NoModels);
        }
        let models = file
            .models
            .into_iter()
            .map(|(name, spec)| match spec.into_estimator(n) {
                Ok(model) => Ok((name, model)),
                Err(source) => Err(ArtifactError::Model { name, source }),
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let vocabulary = file
            .vocabulary
            .unwrap_or_else(|| Vocabulary::from_schema(&schema));

        Ok(ModelBundle {
            schema,
            vocabulary,
            transforms,
            models,
        })
    }

    /// Check the artifact against `manifest.json`, if there is one.
    fn verify_manifest(&self, path: &Path, artifact_bytes: &[u8]) -> Result<(), ArtifactError> {
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let manifest_path = base_dir.join(MANIFEST_FILE);

        if !manifest_path.exists() {
            if self.require_manifest {
                return Err(ArtifactError::Integrity(format!(
                    "manifest required but not found at {manifest_path:?}"
                )));
            }
            tracing::warn!("No {MANIFEST_FILE} next to artifact; skipping integrity check");
            return Ok(());
        }

        let manifest: Manifest = serde_json::from_slice(&read(&manifest_path)?)?;
        if manifest.version != 1 {
            return Err(ArtifactError::Integrity(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }

        let artifact_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if !manifest.files.contains_key(artifact_name) {
            return Err(ArtifactError::Integrity(format!(
                "manifest does not bind {artifact_name}"
            )));
        }

        for (rel, expected) in &manifest.files {
            let actual = if rel == artifact_name {
                sha256_hex(artifact_bytes)
            } else {
                sha256_hex(&read(&base_dir.join(rel))?)
            };
            if !actual.eq_ignore_ascii_case(expected.trim()) {
                return Err(ArtifactError::Integrity(format!("hash mismatch for {rel}")));
            }
        }

        tracing::debug!("Artifact manifest verified ({} files)", manifest.files.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTIFACT: &str = r#"{
        "feature_names": ["age", "delay_days", "gender_Male", "gender_Female", "fever"],
        "imputer": {"strategy": "mean", "statistics": [50.0, 4.0, 0.0, 0.0, 0.0]},
        "scaler": {"mean": [50.0, 4.0, 0.5, 0.5, 0.3], "scale": [15.0, 3.0, 0.5, 0.5, 0.4]},
        "models": {
            "Logistic Regression": {"kind": "logistic", "coefficients": [1.2, 0.4, 0.1, -0.1, 0.3], "intercept": -0.5},
            "SVM": {"kind": "linear_svc", "coefficients": [1.0, 0.0, 0.0, 0.0, 0.0], "intercept": 0.0}
        }
    }"#;

    #[test]
    fn test_from_slice_builds_bundle() {
        let bundle = ArtifactLoader::from_slice(ARTIFACT.as_bytes()).expect("Should load");
        assert_eq!(bundle.schema.len(), 5);
        assert_eq!(bundle.transforms.len(), 2);
        assert_eq!(bundle.model_names(), vec!["Logistic Regression", "SVM"]);
        assert_eq!(bundle.default_model_name(), Some("Logistic Regression"));
        assert_eq!(bundle.vocabulary.resolve("gender", "erkek"), Some("Male"));
    }

    #[test]
    fn test_missing_feature_names_is_schema_error() {
        let err = ArtifactLoader::from_slice(br#"{"models": {}}"#).expect_err("should fail");
        assert!(matches!(
            err,
            ArtifactError::Schema(NormalizeError::SchemaMismatch(_))
        ));

        let err = ArtifactLoader::from_slice(br#"{"feature_names": []}"#).expect_err("should fail");
        assert!(matches!(err, ArtifactError::Schema(_)));
    }

    #[test]
    fn test_model_width_is_checked() {
        let json = r#"{
            "feature_names": ["age", "fever"],
            "models": {"LR": {"kind": "logistic", "coefficients": [1.0], "intercept": 0.0}}
        }"#;
        let err = ArtifactLoader::from_slice(json.as_bytes()).expect_err("should fail");
        assert!(matches!(err, ArtifactError::Model { ref name, .. } if name == "LR"));
    }

    #[test]
    fn test_manifest_binding() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("model.json");
        fs::write(&path, ARTIFACT).expect("write artifact");

        // No manifest: allowed unless required.
        assert!(ArtifactLoader::new(false).load(&path).is_ok());
        assert!(matches!(
            ArtifactLoader::new(true).load(&path),
            Err(ArtifactError::Integrity(_))
        ));

        let digest = sha256_hex(ARTIFACT.as_bytes());
        let manifest = format!(r#"{{"version": 1, "files": {{"model.json": "{digest}"}}}}"#);
        fs::write(dir.path().join(MANIFEST_FILE), manifest).expect("write manifest");
        assert!(ArtifactLoader::new(true).load(&path).is_ok());

        fs::write(&path, ARTIFACT.replace("-0.5", "-0.6")).expect("tamper");
        let err = ArtifactLoader::new(true).load(&path).expect_err("tampered");
        assert!(err.to_string().contains("hash mismatch"));
    }
}
