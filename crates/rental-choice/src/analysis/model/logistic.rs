use super::design::DesignMatrix;
use super::linalg::{dot, solve_normal_equations, weighted_cross_products};
use super::ModelError;
use serde::Serialize;

const PROBABILITY_FLOOR: f64 = 1e-10;
const SEPARATION_MARGIN: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrlsSettings {
    pub max_iterations: usize,
    /// Relative deviance change that counts as converged.
    pub tolerance: f64,
}

impl Default for IrlsSettings {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            tolerance: 1e-8,
        }
    }
}

/// Binomial GLM with logit link, fitted by iteratively reweighted least squares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogisticFit {
    pub columns: Vec<String>,
    pub coefficients: Vec<Option<f64>>,
    pub observations: usize,
    pub positives: usize,
    pub iterations: usize,
    pub deviance: f64,
    pub null_deviance: f64,
    /// Some fitted probabilities are numerically 0 or 1.
    pub separation: bool,
}

impl LogisticFit {
    pub fn probability(&self, row: &[f64]) -> f64 {
        sigmoid(dot(&self.coefficients, row))
    }
}

pub fn fit_logistic(
    design: &DesignMatrix,
    outcome: &[bool],
    settings: IrlsSettings,
) -> Result<LogisticFit, ModelError> {
    let n = design.len();
    if n == 0 || n != outcome.len() {
        return Err(ModelError::InsufficientRows {
            rows: n.min(outcome.len()),
            required: 1,
        });
    }

    let positives = outcome.iter().filter(|&&value| value).count();
    if positives == 0 || positives == n {
        return Err(ModelError::DegenerateOutcome {
            positives,
            observations: n,
        });
    }

    let y: Vec<f64> = outcome.iter().map(|&value| f64::from(u8::from(value))).collect();
    let mut mu: Vec<f64> = y.iter().map(|value| (value + 0.5) / 2.0).collect();
    let mut eta: Vec<f64> = mu.iter().map(|p| (p / (1.0 - p)).ln()).collect();
    let mut deviance = binomial_deviance(&y, &mu);

    let p_mean = positives as f64 / n as f64;
    let null_deviance = binomial_deviance(&y, &vec![p_mean; n]);

    for iteration in 1..=settings.max_iterations {
        let weights: Vec<f64> = mu
            .iter()
            .map(|p| (p * (1.0 - p)).max(PROBABILITY_FLOOR))
            .collect();
        let working: Vec<f64> = eta
            .iter()
            .zip(&y)
            .zip(mu.iter().zip(&weights))
            .map(|((eta, y), (mu, w))| eta + (y - mu) / w)
            .collect();

        let (gram, rhs) = weighted_cross_products(&design.rows, &weights, &working);
        let solution = solve_normal_equations(&gram, &rhs);

        eta = design
            .rows
            .iter()
            .map(|row| dot(&solution.coefficients, row))
            .collect();
        mu = eta.iter().map(|value| sigmoid(*value)).collect();

        let updated = binomial_deviance(&y, &mu);
        if !updated.is_finite() {
            return Err(ModelError::NonFinite);
        }
        let change = (updated - deviance).abs() / (updated.abs() + 0.1);
        deviance = updated;

        if change < settings.tolerance {
            let separation = mu
                .iter()
                .any(|p| *p < SEPARATION_MARGIN || *p > 1.0 - SEPARATION_MARGIN);
            return Ok(LogisticFit {
                columns: design.columns.clone(),
                coefficients: solution.coefficients,
                observations: n,
                positives,
                iterations: iteration,
                deviance,
                null_deviance,
                separation,
            });
        }
    }

    Err(ModelError::NotConverged {
        iterations: settings.max_iterations,
    })
}

fn sigmoid(value: f64) -> f64 {
    if value >= 0.0 {
        1.0 / (1.0 + (-value).exp())
    } else {
        let e = value.exp();
        e / (1.0 + e)
    }
}

fn binomial_deviance(y: &[f64], mu: &[f64]) -> f64 {
    -2.0 * y
        .iter()
        .zip(mu)
        .map(|(y, mu)| {
            let p = mu.clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR);
            y * p.ln() + (1.0 - y) * (1.0 - p).ln()
        })
        .sum::<f64>()
}
