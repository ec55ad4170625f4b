//! Linear-regression cost model

use super::{read_json_artifact, ModelError, PipelineError};
use serde::Deserialize;
use std::path::Path;

/// `y = intercept + Σ coefficients[i] * x[i]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegression {
    /// Load a `{"coefficients": [...], "intercept": ...}` file
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let model: Self = read_json_artifact(path)?;

        let finite = model.intercept.is_finite() && model.coefficients.iter().all(|c| c.is_finite());
        if !finite {
            return Err(ModelError::Invalid {
                path: path.to_path_buf(),
                reason: "coefficients and intercept must be finite".to_string(),
            });
        }

        Ok(model)
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Predict a single row
    pub fn predict(&self, features: &[f64]) -> Result<f64, PipelineError> {
        if features.len() != self.n_features() {
            return Err(PipelineError::Transform(format!(
                "cost model expects {} features, got {}",
                self.n_features(),
                features.len()
            )));
        }

        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }
}
