//! Estimators exported from the training notebook.
//!
//! Parameters mirror the fitted scikit-learn attributes so an export script
//! can dump them as-is.

use serde::{Deserialize, Serialize};

use crate::ports::{check_rows, Estimator, ModelError};

/// Serialized model, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Logistic(LogisticRegression),
    DecisionTree(DecisionTree),
    LinearSvc(LinearSvc),
}

impl ModelSpec {
    /// Validate parameters against the schema width and box the estimator.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidParameters` on inconsistent parameters.
    pub fn into_estimator(self, n_features: usize) -> Result<Box<dyn Estimator>, ModelError> {
        match self {
            Self::Logistic(m) => {
                m.validate(n_features)?;
                Ok(Box::new(m))
            }
            Self::DecisionTree(m) => {
                m.validate(n_features)?;
                Ok(Box::new(m))
            }
            Self::LinearSvc(m) => {
                m.validate(n_features)?;
                Ok(Box::new(m))
            }
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn decision(coefficients: &[f64], intercept: f64, row: &[f64]) -> f64 {
    coefficients
        .iter()
        .zip(row)
        .map(|(w, x)| w * x)
        .sum::<f64>()
        + intercept
}

fn check_linear(coefficients: &[f64], intercept: f64, n_features: usize) -> Result<(), ModelError> {
    if coefficients.len() != n_features {
        return Err(ModelError::InvalidParameters(format!(
            "{} coefficients for {n_features} features",
            coefficients.len()
        )));
    }
    if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
        return Err(ModelError::InvalidParameters(
            "non-finite coefficient".to_string(),
        ));
    }
    Ok(())
}

/// Binary logistic regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        check_linear(&self.coefficients, self.intercept, n_features)
    }

    fn probability(&self, row: &[f64]) -> f64 {
        sigmoid(decision(&self.coefficients, self.intercept, row))
    }
}

impl Estimator for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<u8>, ModelError> {
        check_rows(rows, self.n_features())?;
        Ok(rows
            .iter()
            .map(|r| u8::from(self.probability(r) >= 0.5))
            .collect())
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Option<Result<Vec<[f64; 2]>, ModelError>> {
        Some(check_rows(rows, self.n_features()).map(|()| {
            rows.iter()
                .map(|r| {
                    let p = self.probability(r);
                    [1.0 - p, p]
                })
                .collect()
        }))
    }
}

/// Linear support vector classifier (no probability output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvc {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearSvc {
    fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        check_linear(&self.coefficients, self.intercept, n_features)
    }
}

impl Estimator for LinearSvc {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<u8>, ModelError> {
        check_rows(rows, self.n_features())?;
        Ok(rows
            .iter()
            .map(|r| u8::from(decision(&self.coefficients, self.intercept, r) > 0.0))
            .collect())
    }
}

/// Binary decision tree in flat array form.
///
/// Node `i` is a leaf when `children_left[i] == -1`. Otherwise samples with
/// `x[feature[i]] <= threshold[i]` go left. `value[i]` holds class weights
/// `[negative, positive]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<[f64; 2]>,
}

const LEAF: i64 = -1;

impl DecisionTree {
    fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        let invalid = |msg: String| Err(ModelError::InvalidParameters(msg));

        if self.n_features != n_features {
            return invalid(format!(
                "tree expects {} features, schema has {n_features}",
                self.n_features
            ));
        }
        let n = self.children_left.len();
        if n == 0 {
            return invalid("tree has no nodes".to_string());
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return invalid("tree arrays differ in length".to_string());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                if right != LEAF {
                    return invalid(format!("node {node} has only one child"));
                }
                if self.value[node].iter().any(|w| !w.is_finite() || *w < 0.0)
                    || self.value[node].iter().sum::<f64>() <= 0.0
                {
                    return invalid(format!("leaf {node} has no usable class weights"));
                }
                continue;
            }
            // Children always come after their parent, which also rules out cycles.
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return invalid(format!("node {node} has out-of-order child {child}"));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return invalid(format!("node {node} splits on unknown feature {feature}"));
            }
        }
        Ok(())
    }

    fn leaf(&self, row: &[f64]) -> [f64; 2] {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let x = row[self.feature[node] as usize];
            node = if x <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        let [neg, pos] = self.value[node];
        let total = neg + pos;
        [neg / total, pos / total]
    }
}

impl Estimator for DecisionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<u8>, ModelError> {
        check_rows(rows, self.n_features)?;
        Ok(rows
            .iter()
            .map(|r| {
                let [neg, pos] = self.leaf(r);
                u8::from(pos > neg)
            })
            .collect())
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Option<Result<Vec<[f64; 2]>, ModelError>> {
        Some(check_rows(rows, self.n_features).map(|()| rows.iter().map(|r| self.leaf(r)).collect()))
    }
}
