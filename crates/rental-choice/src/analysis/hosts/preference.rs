use super::rules::HostType;
use crate::analysis::domain::StrProperty;
use crate::analysis::model::{
    fit_logistic, CovariateList, CovariateValue, IrlsSettings, LogisticFit, ModelError,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Preference flag used as the binary response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceOutcome {
    Likely,
    Potential,
}

impl PreferenceOutcome {
    pub const fn ordered() -> [Self; 2] {
        [Self::Likely, Self::Potential]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Likely => "lik_pref",
            Self::Potential => "pot_pref",
        }
    }

    pub fn of(self, property: &StrProperty) -> Option<bool> {
        match self {
            Self::Likely => property.preferences.lik_pref,
            Self::Potential => property.preferences.pot_pref,
        }
    }
}

pub fn preference_covariates() -> CovariateList {
    CovariateList::new()
        .categorical("property_type")
        .categorical("bed_bath")
        .categorical("submarket")
        .numeric("guests_per_bedroom")
        .numeric("min_stay")
        .categorical("cancellation_policy")
}

fn covariate_row(property: &StrProperty) -> Option<Vec<CovariateValue>> {
    let listing = &property.listing;
    Some(vec![
        CovariateValue::Level(listing.property_type.clone()),
        CovariateValue::Level(listing.bed_bath()?),
        CovariateValue::Level(listing.submarket.clone()?),
        CovariateValue::Value(listing.guests_per_bedroom()?),
        CovariateValue::Value(f64::from(listing.min_stay?)),
        CovariateValue::Level(listing.cancellation_policy.clone()?),
    ])
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceModelSummary {
    pub host_type: HostType,
    pub outcome: PreferenceOutcome,
    pub fit: LogisticFit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceFailure {
    pub host_type: HostType,
    pub outcome: PreferenceOutcome,
    pub observations: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreferenceModels {
    pub models: Vec<PreferenceModelSummary>,
    pub failures: Vec<PreferenceFailure>,
}

fn fit_segment(
    properties: &[&StrProperty],
    host_type: HostType,
    outcome: PreferenceOutcome,
    settings: IrlsSettings,
) -> Result<LogisticFit, (usize, ModelError)> {
    let mut rows = Vec::new();
    let mut response = Vec::new();
    for property in properties.iter().filter(|p| p.host_type == host_type) {
        if let (Some(flag), Some(row)) = (outcome.of(property), covariate_row(property)) {
            rows.push(row);
            response.push(flag);
        }
    }
    let observations = rows.len();

    let layout = preference_covariates()
        .layout(&rows)
        .map_err(|err| (observations, err))?;
    if observations <= layout.width() {
        return Err((
            observations,
            ModelError::InsufficientRows {
                rows: observations,
                required: layout.width() + 1,
            },
        ));
    }
    let design = layout.matrix(&rows).map_err(|err| (observations, err))?;
    fit_logistic(&design, &response, settings).map_err(|err| (observations, err))
}

/// Fits one model per host type and outcome. Failures are collected, never fatal.
pub fn fit_preference_models(
    properties: &[StrProperty],
    settings: IrlsSettings,
) -> PreferenceModels {
    let mut ordered: Vec<&StrProperty> = properties.iter().collect();
    ordered.sort_by(|a, b| a.property_id().cmp(b.property_id()));

    let segments: Vec<(HostType, PreferenceOutcome)> = HostType::ordered()
        .into_iter()
        .flat_map(|host_type| {
            PreferenceOutcome::ordered()
                .into_iter()
                .map(move |outcome| (host_type, outcome))
        })
        .collect();

    let results: Vec<_> = segments
        .par_iter()
        .map(|&(host_type, outcome)| {
            (
                host_type,
                outcome,
                fit_segment(&ordered, host_type, outcome, settings),
            )
        })
        .collect();

    let mut models = PreferenceModels::default();
    for (host_type, outcome, result) in results {
        match result {
            Ok(fit) => {
                debug!(
                    host_type = host_type.label(),
                    outcome = outcome.label(),
                    observations = fit.observations,
                    iterations = fit.iterations,
                    "fitted preference model"
                );
                models.models.push(PreferenceModelSummary {
                    host_type,
                    outcome,
                    fit,
                });
            }
            Err((observations, err)) => {
                warn!(
                    host_type = host_type.label(),
                    outcome = outcome.label(),
                    observations,
                    error = %err,
                    "preference model not fitted"
                );
                models.failures.push(PreferenceFailure {
                    host_type,
                    outcome,
                    observations,
                    error: err.to_string(),
                });
            }
        }
    }
    models
}
