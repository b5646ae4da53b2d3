//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (model artifact, files).

mod estimator;
mod tabular;

pub use estimator::{check_rows, Estimator, FeatureTransform, ModelBundle, ModelError};
pub use tabular::{Table, TabularIo};
