//! Prediction result types.
//!
//! Represents the output of the risk classifier for one record.

use serde::{Deserialize, Serialize};

/// Binary risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Positive class: at risk
    Positive,
    /// Negative class: expected to recover
    Negative,
}

impl RiskLabel {
    /// Map a raw estimator label (1 = positive).
    #[must_use]
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            Self::Positive
        } else {
            Self::Negative
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Positive => "At risk - further examination recommended",
            Self::Negative => "Low risk - condition appears stable",
        }
    }

    /// Value written to the batch output column.
    #[must_use]
    pub fn column_value(&self) -> &'static str {
        match self {
            Self::Positive => "risk",
            Self::Negative => "recovered",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "POSITIVE"),
            Self::Negative => write!(f, "NEGATIVE"),
        }
    }
}

/// Round a probability to a percentage with two decimals.
#[must_use]
pub fn to_percent(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

/// Classifier output for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: RiskLabel,

    /// Probability of the positive class (0.0 to 1.0), when the model has one
    pub probability: Option<f64>,
}

impl Prediction {
    #[must_use]
    pub fn new(class: u8, probability: Option<f64>) -> Self {
        Self {
            label: RiskLabel::from_class(class),
            probability,
        }
    }

    /// Positive-class probability as a 0-100 percentage, 2 decimals.
    #[must_use]
    pub fn risk_percent(&self) -> Option<f64> {
        self.probability.map(to_percent)
    }

    /// Negative-class probability as a 0-100 percentage, 2 decimals.
    #[must_use]
    pub fn recovery_percent(&self) -> Option<f64> {
        self.probability.map(|p| to_percent(1.0 - p))
    }
}
