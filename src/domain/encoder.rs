//! One-hot encoding of categorical fields.
//!
//! Encoding works from a single record plus a fixed vocabulary, so batch and
//! single-record paths produce identical columns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::{RawRecord, COUNTRY, GENDER, LOCATION, NUMERIC_FIELDS, SYMPTOM_SLOTS};
use super::schema::TargetSchema;

/// Name of the shared group backing the `symptom1..symptom6` slots.
pub const SYMPTOM_GROUP: &str = "symptom";

/// Localized gender labels and their training-time spelling.
const GENDER_ALIASES: [(&str, &str); 6] = [
    ("erkek", "male"),
    ("kadın", "female"),
    ("kadin", "female"),
    ("m", "male"),
    ("f", "female"),
    ("man", "male"),
];

/// How indicator columns are named for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnNaming {
    /// `field_value`, e.g. `gender_Male`
    Prefixed,
    /// the value itself, e.g. `fever`
    Bare,
}

/// Known values for one categorical field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalField {
    pub name: String,
    pub naming: ColumnNaming,
    /// Canonical spellings, as used in the training columns
    pub values: Vec<String>,
}

impl CategoricalField {
    #[must_use]
    pub fn column_for(&self, value: &str) -> String {
        match self.naming {
            ColumnNaming::Prefixed => format!("{}_{}", self.name, value),
            ColumnNaming::Bare => value.to_string(),
        }
    }
}

/// Fold a label for matching: trimmed, lowercase, separators as `_`.
#[must_use]
pub fn fold_label(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// The full set of categorical values known to a model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CategoricalField>", into = "Vec<CategoricalField>")]
pub struct Vocabulary {
    fields: Vec<CategoricalField>,
    // field name -> folded value -> canonical value
    lookup: BTreeMap<String, BTreeMap<String, String>>,
}

impl From<Vec<CategoricalField>> for Vocabulary {
    fn from(fields: Vec<CategoricalField>) -> Self {
        let lookup = fields
            .iter()
            .map(|f| {
                let values = f
                    .values
                    .iter()
                    .map(|v| (fold_label(v), v.clone()))
                    .collect();
                (f.name.clone(), values)
            })
            .collect();
        Self { fields, lookup }
    }
}

impl From<Vocabulary> for Vec<CategoricalField> {
    fn from(v: Vocabulary) -> Self {
        v.fields
    }
}

impl Vocabulary {
    /// Derive the vocabulary from the schema's column names.
    ///
    /// `gender_*`, `country_*` and `location_*` columns give those fields'
    /// values. Every other column that is neither a numeric field nor a
    /// continuous column is taken as a symptom name.
    #[must_use]
    pub fn from_schema(schema: &TargetSchema) -> Self {
        let prefixed = [GENDER, COUNTRY, LOCATION];
        let mut values: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        let mut symptoms = Vec::new();

        for column in schema.columns() {
            let owner = prefixed.iter().find(|f| {
                column
                    .strip_prefix(**f)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .is_some_and(|v| !v.is_empty())
            });
            match owner {
                Some(field) => values
                    .entry(*field)
                    .or_default()
                    .push(column[field.len() + 1..].to_string()),
                None if NUMERIC_FIELDS.contains(&column.as_str()) || schema.is_continuous(column) => {}
                None => symptoms.push(column.clone()),
            }
        }

        let mut fields: Vec<CategoricalField> = prefixed
            .iter()
            .map(|f| CategoricalField {
                name: (*f).to_string(),
                naming: ColumnNaming::Prefixed,
                values: values.remove(f).unwrap_or_default(),
            })
            .collect();
        fields.push(CategoricalField {
            name: SYMPTOM_GROUP.to_string(),
            naming: ColumnNaming::Bare,
            values: symptoms,
        });
        Self::from(fields)
    }

    #[must_use]
    pub fn fields(&self) -> &[CategoricalField] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&CategoricalField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Canonical spelling of `value` for `field`, if known.
    #[must_use]
    pub fn resolve(&self, field: &str, value: &str) -> Option<&str> {
        let known = self.lookup.get(field)?;
        let folded = fold_label(value);
        if let Some(v) = known.get(&folded) {
            return Some(v);
        }
        if field == GENDER {
            let alias = GENDER_ALIASES
                .iter()
                .find(|(from, _)| *from == folded)
                .map(|(_, to)| *to)?;
            return known.get(alias).map(String::as_str);
        }
        None
    }
}

/// Encoder output: an ad hoc set of named numeric columns.
pub type EncodedColumns = BTreeMap<String, f64>;

/// Expands categorical fields into indicator columns.
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    vocabulary: Vocabulary,
}

impl CategoricalEncoder {
    #[must_use]
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Field group backing a record field, if categorical.
    fn group_of(field: &str) -> Option<&str> {
        if SYMPTOM_SLOTS.contains(&field) {
            Some(SYMPTOM_GROUP)
        } else if matches!(field, GENDER | COUNTRY | LOCATION) {
            Some(field)
        } else {
            None
        }
    }

    /// Encode one record.
    ///
    /// Numeric fields pass through under their own name. Each categorical
    /// value with a known spelling sets its indicator to 1; empty or
    /// unrecognized values set nothing.
    #[must_use]
    pub fn encode(&self, record: &RawRecord) -> EncodedColumns {
        let mut out = EncodedColumns::new();

        for (name, _) in record.iter() {
            if Self::group_of(name).is_none() {
                if let Some(n) = record.number(name) {
                    out.insert(name.to_string(), n);
                }
            }
        }

        for (name, value) in record.iter() {
            let Some(group) = Self::group_of(name) else {
                continue;
            };
            let Some(label) = value.as_label() else {
                continue;
            };
            let Some(field) = self.vocabulary.field(group) else {
                continue;
            };
            match self.vocabulary.resolve(group, &label) {
                Some(canonical) => {
                    out.insert(field.column_for(canonical), 1.0);
                }
                None => tracing::trace!(field = group, "Unrecognized categorical value"),
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> TargetSchema {
        TargetSchema::new([
            "age",
            "delay_days",
            "gender_Male",
            "gender_Female",
            "country_China",
            "country_Japan",
            "fever",
            "cough",
            "difficulty_breathing",
            "vis_wuhan",
            "from_wuhan",
            "recov",
        ])
    }

    #[test]
    fn test_vocabulary_from_schema() {
        let vocab = Vocabulary::from_schema(&schema());
        assert_eq!(vocab.field("gender").map(|f| f.values.len()), Some(2));
        assert_eq!(vocab.field("country").map(|f| f.values.len()), Some(2));
        assert_eq!(vocab.field("location").map(|f| f.values.len()), Some(0));
        let symptoms = vocab.field(SYMPTOM_GROUP).expect("symptom group");
        assert_eq!(symptoms.values, ["fever", "cough", "difficulty_breathing"]);
    }

    #[test]
    fn test_continuous_columns_are_not_symptoms() {
        let schema = TargetSchema::with_continuous(
            ["age", "delay_days", "temperature", "fever", "gender_Male"],
            ["age", "delay_days", "temperature"],
        );
        let vocab = Vocabulary::from_schema(&schema);
        let symptoms = vocab.field(SYMPTOM_GROUP).expect("symptom group");
        assert_eq!(symptoms.values, ["fever"]);

        let encoder = CategoricalEncoder::new(vocab);
        let cols = encoder.encode(&RawRecord::new().with("symptom1", "temperature"));
        assert!(cols.is_empty());
    }

    #[test]
    fn test_resolution_is_case_and_separator_insensitive() {
        let vocab = Vocabulary::from_schema(&schema());
        assert_eq!(vocab.resolve("gender", "male"), Some("Male"));
        assert_eq!(vocab.resolve("gender", " FEMALE "), Some("Female"));
        assert_eq!(vocab.resolve("gender", "Erkek"), Some("Male"));
        assert_eq!(vocab.resolve("gender", "Kadın"), Some("Female"));
        assert_eq!(vocab.resolve(SYMPTOM_GROUP, "Difficulty Breathing"), Some("difficulty_breathing"));
        assert_eq!(vocab.resolve("country", "Atlantis"), None);
    }

    #[test]
    fn test_encode_record() {
        let encoder = CategoricalEncoder::new(Vocabulary::from_schema(&schema()));
        let record = RawRecord::new()
            .with("age", 45.0)
            .with("gender", "male")
            .with("country", "china")
            .with("symptom1", "fever")
            .with("symptom2", "")
            .with("symptom3", "sneezing")
            .with("recov", 1.0);

        let cols = encoder.encode(&record);
        assert_eq!(cols.get("age"), Some(&45.0));
        assert_eq!(cols.get("gender_Male"), Some(&1.0));
        assert_eq!(cols.get("country_China"), Some(&1.0));
        assert_eq!(cols.get("fever"), Some(&1.0));
        assert_eq!(cols.get("recov"), Some(&1.0));
        assert!(!cols.contains_key("gender_Female"));
        assert!(!cols.contains_key("sneezing"));
        assert_eq!(cols.len(), 5);
    }

    #[test]
    fn test_unknown_country_sets_no_indicator() {
        let encoder = CategoricalEncoder::new(Vocabulary::from_schema(&schema()));
        let cols = encoder.encode(&RawRecord::new().with("country", "Atlantis"));
        assert!(cols.keys().all(|k| !k.starts_with("country_")));
    }

    #[test]
    fn test_indicator_overrides_passthrough_zero() {
        let encoder = CategoricalEncoder::new(Vocabulary::from_schema(&schema()));
        let record = RawRecord::new().with("fever", 0.0).with("symptom4", "Fever");
        assert_eq!(encoder.encode(&record).get("fever"), Some(&1.0));
    }

    #[test]
    fn test_passthrough_skips_non_finite_and_flag_words() {
        let encoder = CategoricalEncoder::new(Vocabulary::from_schema(&schema()));
        let record = RawRecord::new()
            .with("age", "inf")
            .with("delay_days", "no")
            .with("vis_wuhan", "yes")
            .with("from_wuhan", true);
        let cols = encoder.encode(&record);
        assert!(!cols.contains_key("age"));
        assert!(!cols.contains_key("delay_days"));
        assert_eq!(cols.get("vis_wuhan"), Some(&1.0));
        assert_eq!(cols.get("from_wuhan"), Some(&1.0));
    }

    #[test]
    fn test_explicit_vocabulary_json() {
        let json = r#"[{"name": "gender", "naming": "prefixed", "values": ["male", "female"]}]"#;
        let vocab: Vocabulary = serde_json::from_str(json).expect("Should parse");
        let encoder = CategoricalEncoder::new(vocab);
        let cols = encoder.encode(&RawRecord::new().with("gender", "Erkek"));
        assert_eq!(cols.get("gender_male"), Some(&1.0));
    }
}
