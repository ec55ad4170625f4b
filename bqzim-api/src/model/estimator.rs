//! Cost estimation from predicted attributes

use super::{AttributeEstimate, LinearRegression, PipelineError, StandardScaler};

/// Scale the attribute row and run the linear cost model
pub fn estimate_cost(
    attributes: &AttributeEstimate,
    cost_scaler: &StandardScaler,
    cost_model: &LinearRegression,
) -> Result<f64, PipelineError> {
    let scaled = cost_scaler.transform(&attributes.as_features())?;
    let cost = cost_model.predict(&scaled)?;

    if !cost.is_finite() {
        return Err(PipelineError::Transform(format!(
            "cost model produced a non-finite value ({})",
            cost
        )));
    }

    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_cost() {
        let scaler = StandardScaler::new(vec![1000.0, 2.0, 1.0, 0.0], vec![100.0, 1.0, 1.0, 1.0]).unwrap();
        let model = LinearRegression {
            coefficients: vec![10_000.0, 5_000.0, 2_000.0, 1_000.0],
            intercept: 100_000.0,
        };
        let attributes = AttributeEstimate {
            square_feet: 1200,
            beds: 3,
            baths: 2,
            garages: 1,
        };

        // scaled = [2, 1, 1, 1]
        let cost = estimate_cost(&attributes, &scaler, &model).unwrap();
        assert_eq!(cost, 100_000.0 + 20_000.0 + 5_000.0 + 2_000.0 + 1_000.0);
    }

    #[test]
    fn test_feature_order_matters() {
        let scaler = StandardScaler::new(vec![0.0; 4], vec![1.0; 4]).unwrap();
        let model = LinearRegression {
            coefficients: vec![1.0, 0.0, 0.0, 0.0],
            intercept: 0.0,
        };
        let attributes = AttributeEstimate {
            square_feet: 900,
            beds: 1,
            baths: 1,
            garages: 1,
        };

        assert_eq!(estimate_cost(&attributes, &scaler, &model).unwrap(), 900.0);
    }
}
