//! House attribute and cost models
//!
//! The prediction pipeline, leaves first:
//! - [`preprocess`]: image bytes → normalized `(1, 224, 224, 3)` tensor
//! - [`predictor`]: tensor → [`AttributeEstimate`] via the image-regression
//!   model and the attribute scaler's inverse transform
//! - [`estimator`]: [`AttributeEstimate`] → estimated cost via the cost-feature
//!   scaler and the linear-regression model
//! - [`registry`]: the immutable [`ModelBundle`] holding all four artifacts
//!
//! Each stage reports its own [`PipelineError`] variant so failures can be
//! logged by origin while the HTTP layer returns one generic message.

pub mod estimator;
pub mod linear;
pub mod predictor;
pub mod preprocess;
pub mod registry;
pub mod regressor;
pub mod scaler;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub use linear::LinearRegression;
pub use registry::{ImageModel, ModelBundle};
pub use regressor::{AttributeRegressor, OnnxRegressor};
pub use scaler::StandardScaler;

/// Width and height the image model expects
pub const INPUT_SIZE: usize = 224;

/// Color channels fed to the image model (RGB)
pub const CHANNELS: usize = 3;

/// Attributes predicted per image: square feet, beds, baths, garages
pub const NUM_ATTRIBUTES: usize = 4;

/// Artifact file names inside the models directory
pub const IMAGE_MODEL_FILE: &str = "model_boq.onnx";
pub const COST_MODEL_FILE: &str = "linear_regression_model.json";
pub const ATTRIBUTE_SCALER_FILE: &str = "scaler.json";
pub const COST_SCALER_FILE: &str = "reg_scaler.json";

/// Physical house attributes predicted from an image
///
/// Values are truncated toward zero from the model output and are not
/// clamped, so a badly-fitted model can yield negative counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeEstimate {
    pub square_feet: i64,
    pub beds: i64,
    pub baths: i64,
    pub garages: i64,
}

impl AttributeEstimate {
    /// Feature row in model order `[square_feet, beds, baths, garages]`
    pub fn as_features(&self) -> [f64; NUM_ATTRIBUTES] {
        [
            self.square_feet as f64,
            self.beds as f64,
            self.baths as f64,
            self.garages as f64,
        ]
    }
}

/// Full prediction returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    #[serde(flatten)]
    pub attributes: AttributeEstimate,
    pub estimated_cost: f64,
}

/// Failure loading one of the model artifacts at startup
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("Failed to load ONNX model {path}: {reason}")]
    Onnx { path: PathBuf, reason: String },

    /// Artifacts loaded but disagree on the attribute row width
    #[error("{name} has {width} features, expected {expected}")]
    FeatureWidth {
        name: &'static str,
        width: usize,
        expected: usize,
    },
}

/// Failure inside one prediction, tagged by stage
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Image bytes could not be decoded
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The image model is not loaded or failed to run
    #[error("Model inference failed: {0}")]
    Inference(String),

    /// A scaler or the cost model rejected its input
    #[error("Feature transform failed: {0}")]
    Transform(String),
}

impl PipelineError {
    /// Stage name for logs
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Decode(_) => "decode",
            PipelineError::Inference(_) => "inference",
            PipelineError::Transform(_) => "transform",
        }
    }
}

/// Read and deserialize a JSON artifact
pub(crate) fn read_json_artifact<T>(path: &std::path::Path) -> Result<T, ModelError>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&content).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
