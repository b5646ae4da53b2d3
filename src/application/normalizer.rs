//! Feature normalizer: turns raw records into model-ready rows.
//!
//! For each record:
//! 1. Resolve `delay_days` (explicit value, else from dates)
//! 2. One-hot encode categorical fields
//! 3. Align onto the target schema
//!
//! Rows are independent; nothing carries over from one record to the next.

use crate::domain::record::DELAY_DAYS;
use crate::domain::{
    CategoricalEncoder, DateDeltaComputer, NormalizeError, NormalizedRow, RawRecord,
    SchemaAligner, TargetSchema, Vocabulary,
};

/// Composes date delta, encoding and alignment.
#[derive(Debug, Clone)]
pub struct FeatureNormalizer {
    delay: DateDeltaComputer,
    encoder: CategoricalEncoder,
    aligner: SchemaAligner,
}

impl FeatureNormalizer {
    /// Create a normalizer for a given vocabulary.
    #[must_use]
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            delay: DateDeltaComputer,
            encoder: CategoricalEncoder::new(vocabulary),
            aligner: SchemaAligner,
        }
    }

    /// Create a normalizer whose vocabulary is derived from the schema.
    #[must_use]
    pub fn for_schema(schema: &TargetSchema) -> Self {
        Self::new(Vocabulary::from_schema(schema))
    }

    /// Normalize a batch of records.
    ///
    /// Output has one row per record, in input order, each with exactly
    /// `schema.len()` columns in schema order.
    ///
    /// # Errors
    /// Returns `NormalizeError::SchemaMismatch` if the schema is empty or
    /// degenerate. Record contents never cause an error.
    pub fn normalize(
        &self,
        records: &[RawRecord],
        schema: &TargetSchema,
    ) -> Result<Vec<NormalizedRow>, NormalizeError> {
        schema.validate()?;
        let rows: Vec<NormalizedRow> = records
            .iter()
            .map(|record| self.normalize_record(record, schema))
            .collect();
        tracing::debug!(
            "Normalized {} records against {} columns",
            rows.len(),
            schema.len()
        );
        Ok(rows)
    }

    /// Normalize a single record.
    ///
    /// # Errors
    /// See [`normalize`](Self::normalize).
    pub fn normalize_one(
        &self,
        record: &RawRecord,
        schema: &TargetSchema,
    ) -> Result<NormalizedRow, NormalizeError> {
        schema.validate()?;
        Ok(self.normalize_record(record, schema))
    }

    fn normalize_record(&self, record: &RawRecord, schema: &TargetSchema) -> NormalizedRow {
        let mut encoded = self.encoder.encode(record);
        encoded.insert(DELAY_DAYS.to_string(), self.delay.resolve(record));
        self.aligner.align_unchecked(&encoded, schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;

    fn example_schema() -> TargetSchema {
        TargetSchema::new([
            "age",
            "delay_days",
            "gender_male",
            "gender_female",
            "fever",
            "cough",
            "vis_wuhan",
            "from_wuhan",
            "recov",
        ])
    }

    fn example_record() -> RawRecord {
        RawRecord::new()
            .with("age", 45.0)
            .with("gender", "male")
            .with("delay_days", 3.0)
            .with("vis_wuhan", 0.0)
            .with("from_wuhan", 0.0)
            .with("recov", 1.0)
            .with("symptom1", "fever")
    }

    #[test]
    fn test_worked_example() {
        let schema = example_schema();
        let normalizer = FeatureNormalizer::for_schema(&schema);
        let row = normalizer
            .normalize_one(&example_record(), &schema)
            .expect("Should normalize");
        assert_eq!(row.values(), [45.0, 3.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_batch_width_and_order() {
        let schema = example_schema();
        let normalizer = FeatureNormalizer::for_schema(&schema);

        let records: Vec<RawRecord> = (0..100)
            .map(|i| {
                let mut r = RawRecord::new()
                    .with("age", f64::from(i))
                    .with("gender", if i % 2 == 0 { "female" } else { "Erkek" })
                    .with("country", "Nowhere")
                    .with("extra_column", "ignored");
                if i % 3 == 0 {
                    r.set("symptom2", "cough");
                }
                r
            })
            .collect();

        let rows = normalizer.normalize(&records, &schema).expect("Should normalize");
        assert_eq!(rows.len(), 100);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), schema.len());
            assert_eq!(row.get(&schema, "age"), Some(i as f64));
            let male = if i % 2 == 0 { 0.0 } else { 1.0 };
            assert_eq!(row.get(&schema, "gender_male"), Some(male));
            assert_eq!(row.get(&schema, "gender_female"), Some(1.0 - male));
            let cough = if i % 3 == 0 { 1.0 } else { 0.0 };
            assert_eq!(row.get(&schema, "cough"), Some(cough));
            assert_eq!(row.get(&schema, "delay_days"), Some(0.0));
        }

        // Single-record path matches the batch path.
        let single = normalizer
            .normalize_one(&records[42], &schema)
            .expect("Should normalize");
        assert_eq!(single, rows[42]);
    }

    #[test]
    fn test_idempotent_on_normalized_row() {
        let schema = example_schema();
        let normalizer = FeatureNormalizer::for_schema(&schema);
        let row = normalizer
            .normalize_one(&example_record(), &schema)
            .expect("Should normalize");

        let as_record: RawRecord = schema
            .columns()
            .iter()
            .cloned()
            .zip(row.values().iter().map(|v| FieldValue::Number(*v)))
            .collect();
        let again = normalizer
            .normalize_one(&as_record, &schema)
            .expect("Should normalize");
        assert_eq!(again, row);
    }

    #[test]
    fn test_dates_derive_delay() {
        let schema = example_schema();
        let normalizer = FeatureNormalizer::for_schema(&schema);
        let headers = ["id", "age", "sym_on", "hosp_vis"];

        let rows = normalizer
            .normalize(
                &[
                    RawRecord::from_text_fields(&headers, &["1", "50", "2020-01-01", "2020-01-10"]),
                    RawRecord::from_text_fields(&headers, &["2", "50", "2020-01-10", "2020-01-01"]),
                    RawRecord::from_text_fields(&headers, &["3", "50", "garbage", "2020-01-01"]),
                ],
                &schema,
            )
            .expect("Should normalize");

        assert_eq!(rows[0].get(&schema, "delay_days"), Some(9.0));
        assert_eq!(rows[1].get(&schema, "delay_days"), Some(0.0));
        assert_eq!(rows[2].get(&schema, "delay_days"), Some(0.0));
    }

    #[test]
    fn test_missing_age_is_nan_and_flags_are_zero() {
        let schema = example_schema();
        let normalizer = FeatureNormalizer::for_schema(&schema);
        let row = normalizer
            .normalize_one(&RawRecord::new().with("gender", "female"), &schema)
            .expect("Should normalize");

        assert!(row.values()[0].is_nan());
        assert_eq!(&row.values()[1..], [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_word_cells_in_numeric_columns_are_missing() {
        let schema = TargetSchema::new(["age", "delay_days", "vis_wuhan"]);
        let normalizer = FeatureNormalizer::for_schema(&schema);
        let record = RawRecord::from_text_fields(
            &["age", "delay_days", "vis_wuhan"],
            &["no", "yes", "yes"],
        );
        let row = normalizer.normalize_one(&record, &schema).expect("Should normalize");

        assert!(row.values()[0].is_nan());
        assert_eq!(&row.values()[1..], [0.0, 1.0]);
    }

    #[test]
    fn test_out_of_domain_age_passes_through() {
        let schema = example_schema();
        let normalizer = FeatureNormalizer::for_schema(&schema);
        let row = normalizer
            .normalize_one(&RawRecord::new().with("age", -4.0).with("delay_days", 99.0), &schema)
            .expect("Should normalize");
        assert_eq!(row.get(&schema, "age"), Some(-4.0));
        assert_eq!(row.get(&schema, "delay_days"), Some(30.0));
    }

    #[test]
    fn test_unknown_country_gives_zero_indicators() {
        let schema = TargetSchema::new(["age", "country_China", "country_Italy"]);
        let normalizer = FeatureNormalizer::for_schema(&schema);
        let row = normalizer
            .normalize_one(&RawRecord::new().with("age", 30.0).with("country", "Narnia"), &schema)
            .expect("Should normalize");
        assert_eq!(row.values(), [30.0, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_schema_is_configuration_error() {
        let schema = TargetSchema::new(Vec::<String>::new());
        let normalizer = FeatureNormalizer::for_schema(&schema);
        let err = normalizer
            .normalize(&[example_record()], &schema)
            .expect_err("should fail");
        assert!(matches!(err, NormalizeError::SchemaMismatch(_)));
    }

    #[test]
    fn test_concurrent_callers_share_schema() {
        let schema = std::sync::Arc::new(example_schema());
        let normalizer = std::sync::Arc::new(FeatureNormalizer::for_schema(&schema));
        let expected = normalizer
            .normalize_one(&example_record(), &schema)
            .expect("Should normalize");

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let rows = normalizer
                        .normalize(&vec![example_record(); 25], &schema)
                        .expect("Should normalize");
                    assert!(rows.iter().all(|r| *r == expected));
                });
            }
        });
    }
}
