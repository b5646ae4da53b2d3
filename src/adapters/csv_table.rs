//! CSV adapter: Implementation of TabularIo.

use std::path::Path;

use crate::ports::{Table, TabularIo};

/// Error type for table operations.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input has no header row")]
    MissingHeader,
}

/// CSV files with a header row.
#[derive(Debug, Clone, Copy)]
pub struct CsvTable {
    delimiter: u8,
}

impl Default for CsvTable {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Parse a table from any reader.
    ///
    /// Short rows are padded with empty cells so every row matches the header.
    ///
    /// # Errors
    /// Returns error on malformed CSV or a missing header.
    pub fn read_from<R: std::io::Read>(&self, reader: R) -> Result<Table, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(TableError::MissingHeader);
        }

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        tracing::debug!("Read {} rows x {} columns", rows.len(), headers.len());
        Ok(Table::new(headers, rows))
    }

    /// Serialize a table to any writer.
    ///
    /// # Errors
    /// Returns error if writing fails.
    pub fn write_to<W: std::io::Write>(&self, writer: W, table: &Table) -> Result<(), TableError> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_writer(writer);
        wtr.write_record(&table.headers)?;
        for row in &table.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl TabularIo for CsvTable {
    type Error = TableError;

    fn read_table(&self, path: &Path) -> Result<Table, Self::Error> {
        let file = std::fs::File::open(path)?;
        self.read_from(file)
    }

    fn write_table(&self, path: &Path, table: &Table) -> Result<(), Self::Error> {
        let file = std::fs::File::create(path)?;
        self.write_to(file, table)
    }
}
