//! Raw patient records as they arrive from a form submission or a CSV row.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const AGE: &str = "age";
pub const GENDER: &str = "gender";
pub const COUNTRY: &str = "country";
pub const LOCATION: &str = "location";
pub const VISITED_WUHAN: &str = "vis_wuhan";
pub const FROM_WUHAN: &str = "from_wuhan";
pub const RECOVERED: &str = "recov";
pub const DELAY_DAYS: &str = "delay_days";
pub const SYMPTOM_ONSET: &str = "sym_on";
pub const HOSPITAL_VISIT: &str = "hosp_vis";
pub const ID: &str = "id";

/// Symptom slots, in form order.
pub const SYMPTOM_SLOTS: [&str; 6] = [
    "symptom1", "symptom2", "symptom3", "symptom4", "symptom5", "symptom6",
];

/// Fields that carry a number rather than a category.
pub const NUMERIC_FIELDS: [&str; 5] = [AGE, DELAY_DAYS, VISITED_WUHAN, FROM_WUHAN, RECOVERED];

/// Binary indicator fields; these also accept yes/no and true/false.
pub const FLAG_FIELDS: [&str; 3] = [VISITED_WUHAN, FROM_WUHAN, RECOVERED];

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    Text(String),
    Missing,
}

impl FieldValue {
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => !n.is_finite(),
            Self::Bool(_) | Self::Date(_) => false,
        }
    }

    /// Finite numeric value. Text must be a plain number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => parse_number(s),
            _ => None,
        }
    }

    /// Like [`as_number`](Self::as_number), also accepting yes/no and
    /// true/false text.
    #[must_use]
    pub fn as_flag(&self) -> Option<f64> {
        match self {
            Self::Text(s) => parse_flag(s),
            other => other.as_number(),
        }
    }

    /// Textual form of a categorical value; numbers are formatted.
    #[must_use]
    pub fn as_label(&self) -> Option<String> {
        match self {
            Self::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Self::Number(n) if n.is_finite() => Some(format!("{n}")),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Missing, Into::into)
    }
}

/// Parse a numeric cell. `inf`, `NaN` and overflowing values count as missing.
fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a binary indicator cell; yes/no and true/false map to 1/0.
fn parse_flag(s: &str) -> Option<f64> {
    parse_number(s).or_else(|| match s.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" => Some(1.0),
        "no" | "false" => Some(0.0),
        _ => None,
    })
}

/// One subject's raw field values. Transient: built per submission or row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// A present, non-empty value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field).filter(|v| !v.is_missing())
    }

    /// Numeric value of a field. Binary indicator fields also accept
    /// yes/no and true/false.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        let value = self.get(field)?;
        if FLAG_FIELDS.contains(&field) {
            value.as_flag()
        } else {
            value.as_number()
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a record from one row of a tabular file.
    ///
    /// Empty cells are missing. Known numeric fields that fail to parse are
    /// missing as well; they are never kept as text.
    #[must_use]
    pub fn from_text_fields<H, C>(headers: &[H], cells: &[C]) -> Self
    where
        H: AsRef<str>,
        C: AsRef<str>,
    {
        let mut record = Self::new();
        for (header, cell) in headers.iter().zip(cells) {
            let name = header.as_ref().trim();
            let raw = cell.as_ref().trim();
            let value = if raw.is_empty() {
                FieldValue::Missing
            } else if FLAG_FIELDS.contains(&name) {
                parse_flag(raw).map_or(FieldValue::Missing, FieldValue::Number)
            } else if NUMERIC_FIELDS.contains(&name) {
                parse_number(raw).map_or(FieldValue::Missing, FieldValue::Number)
            } else if name == SYMPTOM_ONSET || name == HOSPITAL_VISIT || is_categorical(name) {
                FieldValue::Text(raw.to_string())
            } else {
                parse_number(raw)
                    .map_or_else(|| FieldValue::Text(raw.to_string()), FieldValue::Number)
            };
            record.set(name, value);
        }
        record
    }
}

fn is_categorical(name: &str) -> bool {
    matches!(name, GENDER | COUNTRY | LOCATION) || SYMPTOM_SLOTS.contains(&name)
}

impl FromIterator<(String, FieldValue)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// The interactive risk form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientForm {
    /// Age in years (0-120 in the form widget)
    pub age: u32,

    /// Gender label, English or localized (e.g. "Erkek", "Kadın")
    pub gender: String,

    #[serde(default)]
    pub country: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    /// Visited Wuhan
    #[serde(default)]
    pub visited_wuhan: bool,

    /// Resident of Wuhan
    #[serde(default)]
    pub from_wuhan: bool,

    #[serde(default)]
    pub recovered: bool,

    /// Reported symptoms, first six are used
    #[serde(default)]
    pub symptoms: Vec<String>,

    #[serde(default)]
    pub symptom_onset: Option<NaiveDate>,

    #[serde(default)]
    pub hospital_visit: Option<NaiveDate>,
}

impl PatientForm {
    /// Convert the form into a raw record.
    #[must_use]
    pub fn into_record(self) -> RawRecord {
        let flag = |b: bool| FieldValue::Number(if b { 1.0 } else { 0.0 });

        let mut record = RawRecord::new()
            .with(AGE, f64::from(self.age))
            .with(GENDER, self.gender)
            .with(COUNTRY, self.country)
            .with(LOCATION, self.location)
            .with(VISITED_WUHAN, flag(self.visited_wuhan))
            .with(FROM_WUHAN, flag(self.from_wuhan))
            .with(RECOVERED, flag(self.recovered))
            .with(SYMPTOM_ONSET, self.symptom_onset)
            .with(HOSPITAL_VISIT, self.hospital_visit);

        if self.symptoms.len() > SYMPTOM_SLOTS.len() {
            tracing::warn!(
                "Form lists {} symptoms, only the first {} are used",
                self.symptoms.len(),
                SYMPTOM_SLOTS.len()
            );
        }
        let mut symptoms = self.symptoms.into_iter();
        for slot in SYMPTOM_SLOTS {
            record.set(slot, symptoms.next());
        }
        record
    }
}
