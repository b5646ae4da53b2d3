//! # Covirisk
//!
//! COVID-19 patient risk prediction from raw clinical records.
//!
//! This crate provides:
//! - Feature normalization of raw records onto a fixed training schema
//! - Loading of an exported preprocessing + model artifact
//! - Single-record and CSV batch prediction
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types and pure transforms (records, schema, encoding)
//! - `ports`: Trait definitions for the model chain and tabular files
//! - `adapters`: Concrete implementations (JSON artifact, CSV, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{BatchPredictor, FeatureNormalizer, PredictionService};
pub use domain::{NormalizeError, NormalizedRow, Prediction, RawRecord, RiskLabel, TargetSchema};

/// Result type for Covirisk operations
pub type Result<T> = std::result::Result<T, CoviriskError>;

/// Main error type for Covirisk
#[derive(Debug, thiserror::Error)]
pub enum CoviriskError {
    #[error("Configuration problem: {0}")]
    Schema(#[from] domain::NormalizeError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("Table I/O failed: {0}")]
    Table(Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoviriskError {
    /// Whether the failure comes from configuration (schema, artifact, model
    /// selection) rather than from the data being processed.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Schema(_) | Self::Artifact(_) | Self::ModelNotLoaded(_)
        ) || matches!(self, Self::Model(ports::ModelError::UnknownModel(_)))
    }
}
