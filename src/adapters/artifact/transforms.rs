//! Fitted imputer and scaler applied between normalization and prediction.

use serde::{Deserialize, Serialize};

use crate::ports::{FeatureTransform, ModelError};

fn check_width(rows: &[Vec<f64>], width: usize) -> Result<(), ModelError> {
    match rows.iter().find(|r| r.len() != width) {
        Some(r) => Err(ModelError::DimensionMismatch {
            expected: width,
            got: r.len(),
        }),
        None => Ok(()),
    }
}

/// Replaces NaN with a per-column fill value (mean/median/constant as fit).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleImputer {
    #[serde(default)]
    pub strategy: Option<String>,
    pub statistics: Vec<f64>,
}

impl FeatureTransform for SimpleImputer {
    fn name(&self) -> &str {
        "imputer"
    }

    fn transform(&self, rows: &mut [Vec<f64>]) -> Result<(), ModelError> {
        check_width(rows, self.statistics.len())?;
        for row in rows.iter_mut() {
            for (x, fill) in row.iter_mut().zip(&self.statistics) {
                if x.is_nan() {
                    *x = *fill;
                }
            }
        }
        Ok(())
    }
}

/// Standardizes each column: `(x - mean) / scale`.
///
/// A zero scale is treated as 1, matching how constant columns are fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// # Errors
    /// Returns `ModelError::InvalidParameters` if the vectors disagree in length.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.mean.len() != self.scale.len() {
            return Err(ModelError::InvalidParameters(format!(
                "scaler has {} means and {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        Ok(())
    }
}

impl FeatureTransform for StandardScaler {
    fn name(&self) -> &str {
        "scaler"
    }

    fn transform(&self, rows: &mut [Vec<f64>]) -> Result<(), ModelError> {
        check_width(rows, self.mean.len())?;
        for row in rows.iter_mut() {
            for ((x, mean), scale) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
                let s = if *scale == 0.0 { 1.0 } else { *scale };
                *x = (*x - mean) / s;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imputer_fills_only_nan() {
        let imputer = SimpleImputer {
            strategy: Some("mean".into()),
            statistics: vec![40.0, 2.0],
        };
        let mut rows = vec![vec![f64::NAN, 5.0], vec![30.0, f64::NAN]];
        imputer.transform(&mut rows).expect("transform");
        assert_eq!(rows, vec![vec![40.0, 5.0], vec![30.0, 2.0]]);
    }

    #[test]
    fn test_scaler() {
        let scaler = StandardScaler {
            mean: vec![40.0, 1.0],
            scale: vec![10.0, 0.0],
        };
        let mut rows = vec![vec![60.0, 3.0]];
        scaler.transform(&mut rows).expect("transform");
        assert_eq!(rows, vec![vec![2.0, 2.0]]);
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = StandardScaler {
            mean: vec![0.0],
            scale: vec![1.0],
        };
        let mut rows = vec![vec![1.0, 2.0]];
        assert_eq!(
            scaler.transform(&mut rows),
            Err(ModelError::DimensionMismatch { expected: 1, got: 2 })
        );
    }
}
