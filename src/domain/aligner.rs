//! Reindexing of encoded columns onto the target schema.

use super::encoder::EncodedColumns;
use super::schema::{NormalizeError, NormalizedRow, TargetSchema};

/// Reindex-with-default onto a fixed column order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaAligner;

impl SchemaAligner {
    /// Produce a row with exactly the schema's columns, in schema order.
    ///
    /// Absent continuous columns become NaN for the downstream imputer; any
    /// other absent column is 0. Columns outside the schema are dropped.
    ///
    /// # Errors
    /// Returns `NormalizeError::SchemaMismatch` if the schema is degenerate.
    pub fn align(
        &self,
        encoded: &EncodedColumns,
        schema: &TargetSchema,
    ) -> Result<NormalizedRow, NormalizeError> {
        schema.validate()?;
        Ok(self.align_unchecked(encoded, schema))
    }

    /// Same as [`align`](Self::align) for a schema already validated.
    pub(crate) fn align_unchecked(
        &self,
        encoded: &EncodedColumns,
        schema: &TargetSchema,
    ) -> NormalizedRow {
        let values = schema
            .columns()
            .iter()
            .map(|column| match encoded.get(column) {
                Some(v) => *v,
                None if schema.is_continuous(column) => f64::NAN,
                None => 0.0,
            })
            .collect();
        NormalizedRow::new(values)
    }
}
