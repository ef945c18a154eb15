//! Batch orchestration: one configuration object threaded through every stage.

use super::calendar::{self, DailyObservation, ObservationWindow, PropertySummary};
use super::domain::{StrListing, StrProperty};
use super::hosts::{fit_preference_models, HostClassifier, PreferenceModels};
use super::imputation::{
    comparables_from, RentImputationEngine, RentModelSummary, ResolutionTier, SegmentFailure,
};
use super::model::IrlsSettings;
use super::reconcile::{self, CanonicalProperty, PropertySnapshot, TransactionHistory};
use super::revenue::RevenueCalculator;
use crate::config::AnalysisConfig;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

/// Immutable inputs for one run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInputs {
    pub observations: Vec<DailyObservation>,
    pub listings: Vec<StrListing>,
    pub snapshots: Vec<PropertySnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub observation_rows: usize,
    pub summaries: usize,
    pub listings: usize,
    pub duplicate_listings: usize,
    /// Listings with no in-window ledger rows.
    pub listings_without_summary: usize,
    pub snapshots: usize,
    pub canonical_properties: usize,
    pub comparables: usize,
    pub comparables_skipped: usize,
    pub tiers: BTreeMap<&'static str, usize>,
    pub host_types: BTreeMap<&'static str, usize>,
    pub rent_model_failures: Vec<SegmentFailure>,
}

/// Everything a run produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisBundle {
    pub properties: Vec<StrProperty>,
    pub canonical_properties: Vec<CanonicalProperty>,
    pub transaction_history: TransactionHistory,
    pub rent_models: Vec<RentModelSummary>,
    pub preference_models: PreferenceModels,
    pub diagnostics: Diagnostics,
}

pub fn run(inputs: AnalysisInputs, config: &AnalysisConfig) -> AnalysisBundle {
    let AnalysisInputs {
        observations,
        listings,
        snapshots,
    } = inputs;
    let mut diagnostics = Diagnostics {
        observation_rows: observations.len(),
        listings: listings.len(),
        snapshots: snapshots.len(),
        ..Diagnostics::default()
    };

    let window = ObservationWindow::new(config.window_start, config.window_days);
    let summaries = calendar::summarize(observations, &window, config.shards);
    diagnostics.summaries = summaries.len();

    let reconciliation = reconcile::reconcile(snapshots);
    diagnostics.canonical_properties = reconciliation.properties.len();

    let mut properties = join_listings(listings, summaries, &mut diagnostics);

    let calculator = RevenueCalculator::new(config);
    for property in &mut properties {
        property.revenue = calculator.figures(&property.listing, &property.summary);
    }

    let (comparables, skipped) = comparables_from(&reconciliation);
    diagnostics.comparables = comparables.len();
    diagnostics.comparables_skipped = skipped;

    let engine = RentImputationEngine::new(comparables, config);
    let subjects: Vec<&StrListing> = properties.iter().map(|p| &p.listing).collect();
    let imputation = engine.impute(&subjects);
    diagnostics.rent_model_failures = imputation.failures;

    let classifier = HostClassifier::new(config);
    for (property, outcome) in properties.iter_mut().zip(imputation.outcomes) {
        property.ltr_imp_revenue = calculator.ltr_revenue(&outcome);
        property.imputation = outcome;
        property.preferences =
            calculator.preferences(&property.revenue, property.ltr_imp_revenue);
        property.host_type = classifier.classify(&property.summary);

        *diagnostics
            .tiers
            .entry(property.imputation.tier.label())
            .or_default() += 1;
        *diagnostics
            .host_types
            .entry(property.host_type.label())
            .or_default() += 1;
    }

    let unresolved = diagnostics
        .tiers
        .get(ResolutionTier::Unresolved.label())
        .copied()
        .unwrap_or(0);
    if unresolved > 0 {
        warn!(unresolved, "properties without an imputed long-term rent");
    }

    let preference_models = fit_preference_models(&properties, IrlsSettings::default());

    info!(
        properties = properties.len(),
        rent_models = imputation.models.len(),
        preference_models = preference_models.models.len(),
        preference_failures = preference_models.failures.len(),
        "analysis complete"
    );

    AnalysisBundle {
        properties,
        canonical_properties: reconciliation.properties,
        transaction_history: reconciliation.history,
        rent_models: imputation.models,
        preference_models,
        diagnostics,
    }
}

/// Pairs each listing with its summary. Duplicate listing ids keep the first row.
fn join_listings(
    listings: Vec<StrListing>,
    summaries: Vec<PropertySummary>,
    diagnostics: &mut Diagnostics,
) -> Vec<StrProperty> {
    let mut by_id: HashMap<String, PropertySummary> = summaries
        .into_iter()
        .map(|summary| (summary.property_id.clone(), summary))
        .collect();

    let mut seen = HashSet::new();
    let mut properties = Vec::with_capacity(listings.len());
    for listing in listings {
        if !seen.insert(listing.property_id.clone()) {
            diagnostics.duplicate_listings += 1;
            continue;
        }
        match by_id.remove(&listing.property_id) {
            Some(summary) => properties.push(StrProperty::new(listing, summary)),
            None => diagnostics.listings_without_summary += 1,
        }
    }

    if diagnostics.listings_without_summary > 0 {
        warn!(
            missing = diagnostics.listings_without_summary,
            "listings without ledger rows in the window were excluded"
        );
    }

    properties.sort_by(|a, b| a.property_id().cmp(b.property_id()));
    properties
}
