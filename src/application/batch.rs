//! Batch predictor: annotates a table of patients with predictions.

use std::path::Path;

use crate::domain::record::ID;
use crate::domain::{Prediction, RawRecord};
use crate::ports::{Table, TabularIo};
use crate::CoviriskError;

use super::PredictionService;

/// Output column with the predicted label.
pub const PREDICTION_COLUMN: &str = "prediction";

/// Output column with the positive-class probability, in percent.
pub const PROBABILITY_COLUMN: &str = "risk_probability";

/// Runs a [`PredictionService`] over tabular input.
pub struct BatchPredictor<T: TabularIo> {
    service: PredictionService,
    io: T,
}

impl<T: TabularIo> BatchPredictor<T> {
    pub fn new(service: PredictionService, io: T) -> Self {
        Self { service, io }
    }

    /// Convert table rows to raw records, leaving out the `id` column.
    #[must_use]
    pub fn records(table: &Table) -> Vec<RawRecord> {
        let id_col = table.column_index(ID);
        let headers: Vec<&str> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != id_col)
            .map(|(_, h)| h.as_str())
            .collect();

        table
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<&str> = row
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| Some(*i) != id_col)
                    .map(|(_, c)| c.as_str())
                    .collect();
                RawRecord::from_text_fields(&headers, &cells)
            })
            .collect()
    }

    /// Predict every row and append the result columns.
    ///
    /// The original columns are kept as-is. The probability column is only
    /// added when the selected model produces probabilities.
    ///
    /// # Errors
    /// Returns error if prediction fails for the batch.
    pub fn annotate(&self, table: &Table) -> Result<Table, CoviriskError> {
        let records = Self::records(table);
        let predictions = self.service.predict(&records)?;

        let mut out = table.clone();
        out.push_column(
            PREDICTION_COLUMN,
            predictions
                .iter()
                .map(|p| p.label.column_value().to_string())
                .collect(),
        );
        if predictions.iter().all(|p| p.probability.is_some()) && !predictions.is_empty() {
            out.push_column(
                PROBABILITY_COLUMN,
                predictions.iter().map(format_percent).collect(),
            );
        }
        Ok(out)
    }

    /// Read `input`, annotate it and write the result to `output`.
    ///
    /// # Errors
    /// Returns error on I/O or prediction failure.
    pub fn run(&self, input: &Path, output: &Path) -> Result<usize, CoviriskError> {
        let table = self
            .io
            .read_table(input)
            .map_err(|e| CoviriskError::Table(Box::new(e)))?;
        tracing::info!("Read {} rows for batch prediction", table.len());

        let annotated = self.annotate(&table)?;
        self.io
            .write_table(output, &annotated)
            .map_err(|e| CoviriskError::Table(Box::new(e)))?;

        tracing::info!("Wrote {} annotated rows", annotated.len());
        Ok(annotated.len())
    }
}

fn format_percent(p: &Prediction) -> String {
    p.risk_percent()
        .map(|v| format!("{v:.2}"))
        .unwrap_or_default()
}
