//! Attribute prediction
//!
//! Runs the image model, inverse-scales its output into physical units and
//! truncates each value toward zero.

use super::{AttributeEstimate, AttributeRegressor, PipelineError, StandardScaler, NUM_ATTRIBUTES};
use ndarray::Array4;

/// Predict `[square_feet, beds, baths, garages]` for one image tensor
pub fn predict_attributes(
    regressor: &dyn AttributeRegressor,
    attribute_scaler: &StandardScaler,
    input: &Array4<f32>,
) -> Result<AttributeEstimate, PipelineError> {
    let raw = regressor.regress(input)?;
    if raw.len() != NUM_ATTRIBUTES {
        return Err(PipelineError::Inference(format!(
            "expected {} model outputs, got {}",
            NUM_ATTRIBUTES,
            raw.len()
        )));
    }

    let model_space: Vec<f64> = raw.iter().map(|&v| f64::from(v)).collect();
    let physical = attribute_scaler.inverse_transform(&model_space)?;

    Ok(AttributeEstimate {
        square_feet: truncate(physical[0])?,
        beds: truncate(physical[1])?,
        baths: truncate(physical[2])?,
        garages: truncate(physical[3])?,
    })
}

/// Truncate toward zero; no rounding and no clamping to non-negative
///
/// NaN and infinities have no integer value and are a transform failure.
pub fn truncate(value: f64) -> Result<i64, PipelineError> {
    if !value.is_finite() {
        return Err(PipelineError::Transform(format!(
            "cannot convert {} to an integer attribute",
            value
        )));
    }
    Ok(value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedOutput(Vec<f32>);

    impl AttributeRegressor for FixedOutput {
        fn regress(&self, _input: &Array4<f32>) -> Result<Vec<f32>, PipelineError> {
            Ok(self.0.clone())
        }
    }

    fn input() -> Array4<f32> {
        Array4::zeros((1, 224, 224, 3))
    }

    fn identity_scaler() -> StandardScaler {
        StandardScaler::new(vec![0.0; 4], vec![1.0; 4]).unwrap()
    }

    #[test]
    fn test_truncates_not_rounds() {
        assert_eq!(truncate(2.99).unwrap(), 2);
        assert_eq!(truncate(-2.99).unwrap(), -2);
        assert_eq!(truncate(0.5).unwrap(), 0);
    }

    #[test]
    fn test_truncation_is_idempotent_on_integers() {
        for v in [-3.0, 0.0, 1.0, 1850.0] {
            let once = truncate(v).unwrap();
            assert_eq!(once as f64, v);
            assert_eq!(truncate(once as f64).unwrap(), once);
        }
    }

    #[test]
    fn test_non_finite_is_transform_error() {
        assert!(matches!(truncate(f64::NAN), Err(PipelineError::Transform(_))));
        assert!(matches!(truncate(f64::INFINITY), Err(PipelineError::Transform(_))));
    }

    #[test]
    fn test_inverse_scaling_applied_in_order() {
        let scaler = StandardScaler::new(vec![1500.0, 3.0, 2.0, 1.0], vec![500.0, 1.0, 1.0, 1.0]).unwrap();
        let regressor = FixedOutput(vec![1.0, 0.5, -0.5, 0.9]);

        let estimate = predict_attributes(&regressor, &scaler, &input()).unwrap();
        assert_eq!(
            estimate,
            AttributeEstimate {
                square_feet: 2000,
                beds: 3,
                baths: 1,
                garages: 1,
            }
        );
    }

    #[test]
    fn test_negative_values_preserved() {
        let regressor = FixedOutput(vec![-10.7, -1.2, 0.0, -0.4]);
        let estimate = predict_attributes(&regressor, &identity_scaler(), &input()).unwrap();

        assert_eq!(estimate.square_feet, -10);
        assert_eq!(estimate.beds, -1);
        assert_eq!(estimate.garages, 0);
    }

    #[test]
    fn test_wrong_output_width_is_inference_error() {
        let regressor = FixedOutput(vec![1.0, 2.0, 3.0]);
        let err = predict_attributes(&regressor, &identity_scaler(), &input()).unwrap_err();
        assert_eq!(err.stage(), "inference");
    }
}
