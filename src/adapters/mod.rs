//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external formats:
//! - `artifact`: JSON model bundle (schema, imputer, scaler, estimators)
//! - `csv_table`: CSV batch input/output
//! - `sanitize`: PII filtering for logs

pub mod artifact;
pub mod csv_table;
pub mod sanitize;

pub use artifact::{ArtifactError, ArtifactLoader};
pub use csv_table::{CsvTable, TableError};
