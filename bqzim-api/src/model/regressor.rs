//! Image-regression model
//!
//! The trait is the seam between the pipeline and the inference runtime;
//! production uses [`OnnxRegressor`], tests substitute a deterministic stub.

use super::{ModelError, PipelineError, CHANNELS, INPUT_SIZE};
use ndarray::Array4;
use std::path::Path;
use tract_onnx::prelude::*;

/// Maps a normalized `(1, H, W, C)` image tensor to raw model-space outputs
///
/// Implementations must be pure: same input, same output, no interior
/// mutation visible to callers. They are shared across request threads.
pub trait AttributeRegressor: Send + Sync {
    fn regress(&self, input: &Array4<f32>) -> Result<Vec<f32>, PipelineError>;
}

/// ONNX graph executed with tract
pub struct OnnxRegressor {
    plan: TypedRunnableModel<TypedModel>,
}

impl OnnxRegressor {
    /// Load, type-check against the fixed input shape, and optimize
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let onnx_error = |e: TractError| ModelError::Onnx {
            path: path.to_path_buf(),
            reason: format!("{:#}", e),
        };

        if !path.exists() {
            return Err(ModelError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "model file not found"),
            });
        }

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(onnx_error)?
            .with_input_fact(0, f32::fact([1, INPUT_SIZE, INPUT_SIZE, CHANNELS]).into())
            .map_err(onnx_error)?
            .into_optimized()
            .map_err(onnx_error)?
            .into_runnable()
            .map_err(onnx_error)?;

        Ok(Self { plan })
    }
}

impl AttributeRegressor for OnnxRegressor {
    fn regress(&self, input: &Array4<f32>) -> Result<Vec<f32>, PipelineError> {
        let inference_error = |e: TractError| PipelineError::Inference(format!("{:#}", e));

        // Copy through a flat buffer; tract pins its own ndarray version
        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_shape(input.shape(), &data).map_err(inference_error)?;

        let outputs = self.plan.run(tvec!(tensor.into())).map_err(inference_error)?;
        let output = outputs
            .first()
            .ok_or_else(|| PipelineError::Inference("model produced no outputs".to_string()))?;

        let view = output.to_array_view::<f32>().map_err(inference_error)?;
        Ok(view.iter().copied().collect())
    }
}
