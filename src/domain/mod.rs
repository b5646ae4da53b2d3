//! Domain layer: Core record types and the pure normalization logic.
//!
//! Nothing here performs I/O. Every function is a pure transform of its
//! inputs plus the read-only target schema.

pub mod aligner;
pub mod delay;
pub mod encoder;
mod prediction;
pub mod record;
mod schema;

pub use aligner::SchemaAligner;
pub use delay::DateDeltaComputer;
pub use encoder::{CategoricalEncoder, CategoricalField, ColumnNaming, EncodedColumns, Vocabulary};
pub use prediction::{to_percent, Prediction, RiskLabel};
pub use record::{FieldValue, PatientForm, RawRecord};
pub use schema::{NormalizeError, NormalizedRow, TargetSchema, DEFAULT_CONTINUOUS_FEATURES};
