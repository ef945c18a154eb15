use super::design::DesignMatrix;
use super::linalg::{dot, solve_normal_equations, weighted_cross_products};
use super::ModelError;
use serde::Serialize;

/// Ordinary least squares fit with aliased columns reported as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OlsFit {
    pub columns: Vec<String>,
    pub coefficients: Vec<Option<f64>>,
    pub observations: usize,
    pub rank: usize,
    /// `SSR / (n - rank)`; absent when there are no residual degrees of freedom.
    pub residual_variance: Option<f64>,
    pub r_squared: Option<f64>,
}

impl OlsFit {
    pub fn predict(&self, row: &[f64]) -> f64 {
        dot(&self.coefficients, row)
    }
}

pub fn fit_ols(design: &DesignMatrix, response: &[f64]) -> Result<OlsFit, ModelError> {
    if design.is_empty() || design.len() != response.len() {
        return Err(ModelError::InsufficientRows {
            rows: design.len().min(response.len()),
            required: 1,
        });
    }
    if response.iter().any(|value| !value.is_finite()) {
        return Err(ModelError::NonFinite);
    }

    let weights = vec![1.0; design.len()];
    let (gram, rhs) = weighted_cross_products(&design.rows, &weights, response);
    let solution = solve_normal_equations(&gram, &rhs);

    let n = design.len();
    let mean = response.iter().sum::<f64>() / n as f64;
    let mut residual_ss = 0.0;
    let mut total_ss = 0.0;
    for (row, &observed) in design.rows.iter().zip(response) {
        let fitted = dot(&solution.coefficients, row);
        residual_ss += (observed - fitted).powi(2);
        total_ss += (observed - mean).powi(2);
    }

    let residual_variance = (n > solution.rank).then(|| residual_ss / (n - solution.rank) as f64);
    let r_squared = (total_ss > 0.0).then(|| 1.0 - residual_ss / total_ss);

    Ok(OlsFit {
        columns: design.columns.clone(),
        coefficients: solution.coefficients,
        observations: n,
        rank: solution.rank,
        residual_variance,
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::{CovariateList, CovariateValue};

    #[test]
    fn recovers_group_means_for_a_categorical_term() {
        let covariates = CovariateList::new().categorical("suburb");
        let rows: Vec<Vec<CovariateValue>> = ["a", "a", "b", "b", "c"]
            .iter()
            .map(|level| vec![CovariateValue::Level(level.to_string())])
            .collect();
        let response = vec![1.0, 3.0, 5.0, 7.0, 10.0];

        let layout = covariates.layout(&rows).expect("layout");
        let design = layout.matrix(&rows).expect("matrix");
        let fit = fit_ols(&design, &response).expect("fit");

        assert_eq!(fit.rank, 3);
        let predict = |level: &str| {
            let row = layout
                .encode(&[CovariateValue::Level(level.to_string())])
                .expect("encode");
            fit.predict(&row)
        };
        assert!((predict("a") - 2.0).abs() < 1e-9);
        assert!((predict("b") - 6.0).abs() < 1e-9);
        assert!((predict("c") - 10.0).abs() < 1e-9);
        assert!((fit.residual_variance.expect("df > 0") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_design_is_rejected() {
        let design = DesignMatrix {
            columns: vec!["(intercept)".to_string()],
            rows: Vec::new(),
        };
        assert!(matches!(
            fit_ols(&design, &[]),
            Err(ModelError::InsufficientRows { .. })
        ));
    }
}
