//! Design-matrix construction and the two estimators the analysis needs.
//!
//! Covariates are declared as an ordered [`CovariateList`]; categorical terms are
//! treatment coded against their lexicographically first level, so the column layout
//! depends only on the set of levels seen, never on row order.

mod design;
mod linalg;
mod logistic;
mod ols;

pub use design::{CovariateList, CovariateValue, DesignLayout, DesignMatrix, Term, TermKind};
pub use logistic::{fit_logistic, IrlsSettings, LogisticFit};
pub use ols::{fit_ols, OlsFit};

/// Failure of a single model fit. Never fatal to a batch run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("{rows} usable row(s), at least {required} required")]
    InsufficientRows { rows: usize, required: usize },
    #[error("outcome is degenerate: {positives} of {observations} positive")]
    DegenerateOutcome {
        positives: usize,
        observations: usize,
    },
    #[error("did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },
    #[error("covariate '{term}' expected a {expected} value")]
    CovariateMismatch {
        term: &'static str,
        expected: &'static str,
    },
    #[error("level '{level}' of '{term}' was not seen in training")]
    UnseenLevel { term: &'static str, level: String },
    #[error("row has {actual} covariate(s), layout expects {expected}")]
    RowWidth { expected: usize, actual: usize },
    #[error("non-finite value in design or response")]
    NonFinite,
}
