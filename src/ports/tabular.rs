//! Tabular port: Trait for batch input/output files.
//!
//! This trait abstracts the file format (CSV) from the batch use case.

use std::path::Path;

/// A header row plus string cells, as read from a tabular file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Index of a header, matched exactly after trimming.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a column; `values` must have one entry per row.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.headers.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }
}

/// Trait for reading and writing batch tables.
pub trait TabularIo: Send + Sync {
    /// Error type for table operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a table with a header row.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    fn read_table(&self, path: &Path) -> Result<Table, Self::Error>;

    /// Write a table with a header row.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    fn write_table(&self, path: &Path, table: &Table) -> Result<(), Self::Error>;
}
