//! Model registry
//!
//! Loads the four prediction artifacts once at startup into an immutable
//! [`ModelBundle`]. The bundle is shared read-only by every request.
//!
//! Load policy:
//! - Image model missing or broken: the slot holds [`ImageModel::Unavailable`]
//!   and the service still starts (signup/login keep working, prediction
//!   answers 500).
//! - Cost model or either scaler missing or broken: startup fails, since no
//!   prediction could succeed without them.

use super::estimator::estimate_cost;
use super::predictor::predict_attributes;
use super::preprocess::preprocess;
use super::{
    AttributeRegressor, LinearRegression, ModelError, OnnxRegressor, PipelineError, Prediction,
    StandardScaler, ATTRIBUTE_SCALER_FILE, COST_MODEL_FILE, COST_SCALER_FILE, IMAGE_MODEL_FILE,
    NUM_ATTRIBUTES,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Image-regression slot
pub enum ImageModel {
    Loaded(Arc<dyn AttributeRegressor>),
    /// Load failed at startup; `reason` is kept for logs and health checks
    Unavailable { reason: String },
}

impl std::fmt::Debug for ImageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageModel::Loaded(_) => write!(f, "ImageModel::Loaded"),
            ImageModel::Unavailable { reason } => {
                write!(f, "ImageModel::Unavailable({})", reason)
            }
        }
    }
}

/// All prediction artifacts, immutable after construction
#[derive(Debug)]
pub struct ModelBundle {
    image_model: ImageModel,
    attribute_scaler: StandardScaler,
    cost_model: LinearRegression,
    cost_scaler: StandardScaler,
}

impl ModelBundle {
    /// Assemble a bundle from loaded parts, checking feature widths agree
    pub fn new(
        image_model: ImageModel,
        attribute_scaler: StandardScaler,
        cost_model: LinearRegression,
        cost_scaler: StandardScaler,
    ) -> Result<Self, ModelError> {
        let widths = [
            ("attribute scaler", attribute_scaler.n_features()),
            ("cost model", cost_model.n_features()),
            ("cost scaler", cost_scaler.n_features()),
        ];
        for (name, width) in widths {
            if width != NUM_ATTRIBUTES {
                return Err(ModelError::FeatureWidth {
                    name,
                    width,
                    expected: NUM_ATTRIBUTES,
                });
            }
        }

        Ok(Self {
            image_model,
            attribute_scaler,
            cost_model,
            cost_scaler,
        })
    }

    /// Load every artifact from `models_dir`
    pub fn load(models_dir: &Path) -> Result<Self, ModelError> {
        info!("Loading models from {}", models_dir.display());

        let image_path = models_dir.join(IMAGE_MODEL_FILE);
        let image_model = match OnnxRegressor::load(&image_path) {
            Ok(regressor) => {
                info!("✓ Image model loaded: {}", image_path.display());
                ImageModel::Loaded(Arc::new(regressor))
            }
            Err(e) => {
                warn!("Image model unavailable, predictions will fail: {}", e);
                ImageModel::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        let cost_model = LinearRegression::from_file(&models_dir.join(COST_MODEL_FILE))?;
        let attribute_scaler = StandardScaler::from_file(&models_dir.join(ATTRIBUTE_SCALER_FILE))?;
        let cost_scaler = StandardScaler::from_file(&models_dir.join(COST_SCALER_FILE))?;
        info!("✓ Cost model and scalers loaded");

        Self::new(image_model, attribute_scaler, cost_model, cost_scaler)
    }

    pub fn image_model(&self) -> &ImageModel {
        &self.image_model
    }

    pub fn is_image_model_available(&self) -> bool {
        matches!(self.image_model, ImageModel::Loaded(_))
    }

    /// Run the full pipeline on one uploaded image
    ///
    /// Blocking and CPU-bound; async callers should run it on a blocking
    /// thread.
    pub fn predict(&self, image_bytes: &[u8]) -> Result<Prediction, PipelineError> {
        let regressor = match &self.image_model {
            ImageModel::Loaded(regressor) => regressor,
            ImageModel::Unavailable { reason } => {
                return Err(PipelineError::Inference(format!(
                    "image model not loaded: {}",
                    reason
                )));
            }
        };

        let input = preprocess(image_bytes)?;
        let attributes = predict_attributes(regressor.as_ref(), &self.attribute_scaler, &input)?;
        let estimated_cost = estimate_cost(&attributes, &self.cost_scaler, &self.cost_model)?;

        Ok(Prediction {
            attributes,
            estimated_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    /// Output depends on the mean pixel so different images differ
    struct MeanPixel;

    impl AttributeRegressor for MeanPixel {
        fn regress(&self, input: &Array4<f32>) -> Result<Vec<f32>, PipelineError> {
            let mean = input.mean().unwrap_or(0.0);
            Ok(vec![mean, mean, mean, mean])
        }
    }

    fn write_artifacts(dir: &Path) {
        std::fs::write(
            dir.join(COST_MODEL_FILE),
            r#"{"coefficients": [100.0, 10.0, 10.0, 10.0], "intercept": 50000.0}"#,
        )
        .unwrap();
        let scaler = r#"{"mean": [1500.0, 3.0, 2.0, 1.0], "scale": [500.0, 1.0, 1.0, 1.0]}"#;
        std::fs::write(dir.join(ATTRIBUTE_SCALER_FILE), scaler).unwrap();
        std::fs::write(dir.join(COST_SCALER_FILE), scaler).unwrap();
    }

    fn png_bytes(gray: u8) -> Vec<u8> {
        let image = image::GrayImage::from_pixel(300, 200, image::Luma([gray]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageLuma8(image)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn stub_bundle() -> ModelBundle {
        let scaler = StandardScaler::new(vec![1500.0, 3.0, 2.0, 1.0], vec![500.0, 1.0, 1.0, 1.0]).unwrap();
        ModelBundle::new(
            ImageModel::Loaded(Arc::new(MeanPixel)),
            scaler.clone(),
            LinearRegression {
                coefficients: vec![100.0, 10.0, 10.0, 10.0],
                intercept: 50_000.0,
            },
            scaler,
        )
        .unwrap()
    }

    #[test]
    fn test_missing_image_model_degrades() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());

        let bundle = ModelBundle::load(dir.path()).unwrap();
        assert!(!bundle.is_image_model_available());
        assert!(matches!(bundle.image_model(), ImageModel::Unavailable { .. }));

        let err = bundle.predict(&png_bytes(10)).unwrap_err();
        assert_eq!(err.stage(), "inference");
    }

    #[test]
    fn test_corrupt_image_model_degrades() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        std::fs::write(dir.path().join(IMAGE_MODEL_FILE), b"not an onnx graph").unwrap();

        let bundle = ModelBundle::load(dir.path()).unwrap();
        assert!(!bundle.is_image_model_available());
    }

    #[test]
    fn test_missing_scaler_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        std::fs::remove_file(dir.path().join(COST_SCALER_FILE)).unwrap();

        assert!(matches!(ModelBundle::load(dir.path()), Err(ModelError::Io { .. })));
    }

    #[test]
    fn test_missing_cost_model_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        std::fs::remove_file(dir.path().join(COST_MODEL_FILE)).unwrap();

        assert!(ModelBundle::load(dir.path()).is_err());
    }

    #[test]
    fn test_feature_width_mismatch_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path());
        std::fs::write(
            dir.path().join(ATTRIBUTE_SCALER_FILE),
            r#"{"mean": [1.0, 2.0], "scale": [1.0, 1.0]}"#,
        )
        .unwrap();

        assert!(matches!(
            ModelBundle::load(dir.path()),
            Err(ModelError::FeatureWidth {
                name: "attribute scaler",
                width: 2,
                expected: NUM_ATTRIBUTES,
            })
        ));
    }

    #[test]
    fn test_new_rejects_cost_model_width() {
        let scaler = StandardScaler::new(vec![0.0; 4], vec![1.0; 4]).unwrap();
        let result = ModelBundle::new(
            ImageModel::Loaded(Arc::new(MeanPixel)),
            scaler.clone(),
            LinearRegression {
                coefficients: vec![1.0, 2.0, 3.0],
                intercept: 0.0,
            },
            scaler,
        );

        match result {
            Err(ModelError::FeatureWidth { name, width, .. }) => {
                assert_eq!(name, "cost model");
                assert_eq!(width, 3);
            }
            other => panic!("expected FeatureWidth, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_predict_is_deterministic() {
        let bundle = stub_bundle();
        let bytes = png_bytes(128);

        let first = bundle.predict(&bytes).unwrap();
        for _ in 0..3 {
            let again = bundle.predict(&bytes).unwrap();
            assert_eq!(again.attributes, first.attributes);
            assert_eq!(again.estimated_cost.to_bits(), first.estimated_cost.to_bits());
        }
    }

    #[test]
    fn test_predict_chains_stages() {
        let bundle = stub_bundle();

        // Black image: model outputs 0 → inverse-scaled to the means
        let prediction = bundle.predict(&png_bytes(0)).unwrap();
        assert_eq!(prediction.attributes.square_feet, 1500);
        assert_eq!(prediction.attributes.beds, 3);
        assert_eq!(prediction.attributes.baths, 2);
        assert_eq!(prediction.attributes.garages, 1);
        // Attributes equal the cost-scaler means → all scaled features 0
        assert_eq!(prediction.estimated_cost, 50_000.0);
    }

    #[test]
    fn test_predict_decode_failure() {
        let err = stub_bundle().predict(b"garbage").unwrap_err();
        assert_eq!(err.stage(), "decode");
    }
}
