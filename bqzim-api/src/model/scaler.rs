//! Fitted standard scaler
//!
//! Per-feature linear transform fit once during training:
//! `z = (x - mean) / scale`, inverse `x = z * scale + mean`.

use super::{read_json_artifact, ModelError, PipelineError};
use serde::Deserialize;
use std::path::Path;

/// On-disk scaler parameters
#[derive(Debug, Clone, Deserialize)]
struct ScalerParams {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Build a scaler from fitted parameters
    ///
    /// A zero scale (constant feature during fitting) is stored as 1 so the
    /// feature passes through centered but unscaled.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        if mean.len() != scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            ));
        }
        if mean.iter().chain(&scale).any(|v| !v.is_finite()) {
            return Err("parameters must be finite".to_string());
        }

        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Ok(Self { mean, scale })
    }

    /// Load parameters from a `{"mean": [...], "scale": [...]}` file
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let params: ScalerParams = read_json_artifact(path)?;
        Self::new(params.mean, params.scale).map_err(|reason| ModelError::Invalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Number of features this scaler was fit on
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Map physical values into model space
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>, PipelineError> {
        self.check_width(values)?;
        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }

    /// Map model-space values back to physical units
    pub fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>, PipelineError> {
        self.check_width(values)?;
        Ok(values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(z, (mean, scale))| z * scale + mean)
            .collect())
    }

    fn check_width(&self, values: &[f64]) -> Result<(), PipelineError> {
        if values.len() != self.n_features() {
            return Err(PipelineError::Transform(format!(
                "scaler expects {} features, got {}",
                self.n_features(),
                values.len()
            )));
        }
        Ok(())
    }
}
