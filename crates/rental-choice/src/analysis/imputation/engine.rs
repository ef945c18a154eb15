use super::segment::{ImputationOutcome, ResolutionTier, SegmentKey, UnresolvedReason};
use crate::analysis::domain::{bed_bath_label, ProductClass, StrListing};
use crate::analysis::model::{
    fit_ols, CovariateList, CovariateValue, DesignLayout, ModelError, OlsFit,
};
use crate::analysis::reconcile::{CanonicalProperty, Reconciliation, TransactionRecord};
use crate::config::AnalysisConfig;
use chrono::Datelike;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// A long-term property usable as a rent comparable.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparable {
    pub address_id: String,
    pub product_class: ProductClass,
    pub submarket: String,
    pub covariates: Vec<CovariateValue>,
    pub weekly_rent: f64,
}

/// `log(rent) ~ property_type + bed_bath + suburb + month`.
///
/// `property_type` carries the [`ProductClass`] label so short-term and long-term
/// vocabularies share levels.
pub fn rent_covariates() -> CovariateList {
    CovariateList::new()
        .categorical("property_type")
        .categorical("bed_bath")
        .categorical("suburb")
        .categorical("month")
}

fn property_type_level(class: ProductClass) -> CovariateValue {
    CovariateValue::Level(class.label().to_string())
}

fn month_level(month: u32) -> CovariateValue {
    CovariateValue::Level(format!("{month:02}"))
}

/// Builds comparables from canonical properties and their current transaction.
///
/// Properties without a positive current rent or a complete covariate set are skipped;
/// the second value is the skipped count.
pub fn comparables_from(reconciliation: &Reconciliation) -> (Vec<Comparable>, usize) {
    let mut comparables = Vec::new();
    let mut skipped = 0usize;

    for property in &reconciliation.properties {
        let current = reconciliation.history.current(&property.address_id);
        match comparable(property, current) {
            Some(comparable) => comparables.push(comparable),
            None => skipped += 1,
        }
    }

    (comparables, skipped)
}

fn comparable(
    property: &CanonicalProperty,
    current: Option<&TransactionRecord>,
) -> Option<Comparable> {
    let transaction = current?;
    let rent = transaction
        .price
        .filter(|price| *price > 0.0 && price.is_finite())?;
    let month = transaction.date?.month();

    Some(Comparable {
        address_id: property.address_id.clone(),
        product_class: property.product_class,
        submarket: property.submarket.clone()?,
        covariates: vec![
            property_type_level(property.property_type.as_ref().map(|_| property.product_class)?),
            CovariateValue::Level(bed_bath_label(property.bedrooms?, property.bathrooms?)),
            CovariateValue::Level(property.location.suburb.clone()?),
            month_level(month),
        ],
        weekly_rent: rent,
    })
}

/// A fitted segment model and the layout needed to encode subjects.
#[derive(Debug, Clone)]
pub struct RentModel {
    pub segment: SegmentKey,
    pub layout: DesignLayout,
    pub fit: OlsFit,
}

impl RentModel {
    /// Weekly rent for the given covariates, `exp` of the log-scale prediction.
    pub fn predict(&self, covariates: &[CovariateValue]) -> Result<f64, ModelError> {
        let row = self.layout.encode(covariates)?;
        Ok(self.fit.predict(&row).exp())
    }

    pub fn summary(&self) -> RentModelSummary {
        RentModelSummary {
            segment: self.segment.clone(),
            tier: self.segment.tier(),
            fit: self.fit.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentModelSummary {
    pub segment: SegmentKey,
    pub tier: ResolutionTier,
    pub fit: OlsFit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentFailure {
    pub segment: SegmentKey,
    pub error: String,
}

/// Results of imputing a batch of subjects.
#[derive(Debug, Clone)]
pub struct ImputationRun {
    /// One outcome per subject, in input order.
    pub outcomes: Vec<ImputationOutcome>,
    pub models: Vec<RentModelSummary>,
    pub failures: Vec<SegmentFailure>,
}

/// A subject matched to a segment, with the covariates it will be encoded from.
struct Resolved {
    segment: SegmentKey,
    count: usize,
    covariates: Vec<CovariateValue>,
}

/// Segmented hedonic rent model over a read-only comparable table.
pub struct RentImputationEngine {
    covariates: CovariateList,
    min_comparables: usize,
    reference_month: u32,
    by_segment: BTreeMap<SegmentKey, Vec<Comparable>>,
}

impl RentImputationEngine {
    pub fn new(comparables: Vec<Comparable>, config: &AnalysisConfig) -> Self {
        let mut by_segment: BTreeMap<SegmentKey, Vec<Comparable>> = BTreeMap::new();
        for comparable in comparables {
            by_segment
                .entry(SegmentKey::Submarket {
                    submarket: comparable.submarket.clone(),
                })
                .or_default()
                .push(comparable.clone());
            by_segment
                .entry(SegmentKey::Exact {
                    product_class: comparable.product_class,
                    submarket: comparable.submarket.clone(),
                })
                .or_default()
                .push(comparable);
        }

        // accumulation order fixes the floating-point result
        for group in by_segment.values_mut() {
            group.sort_by(|a, b| a.address_id.cmp(&b.address_id));
        }

        Self {
            covariates: rent_covariates(),
            min_comparables: config.min_comparables,
            reference_month: config.reference_month,
            by_segment,
        }
    }

    pub fn comparable_count(&self, segment: &SegmentKey) -> usize {
        self.by_segment.get(segment).map(Vec::len).unwrap_or(0)
    }

    /// Walks the fallback ladder: exact segment, then submarket only.
    ///
    /// A tier qualifies when it has enough comparables and its training data covers every
    /// level of the subject's covariates.
    pub fn resolve(
        &self,
        listing: &StrListing,
        covariates: &[CovariateValue],
    ) -> Result<(SegmentKey, usize), ImputationOutcome> {
        let Some(submarket) = listing.submarket.clone() else {
            return Err(ImputationOutcome::unresolved(
                UnresolvedReason::MissingCovariates,
                0,
            ));
        };

        let ladder = [
            SegmentKey::Exact {
                product_class: listing.product_class(),
                submarket: submarket.clone(),
            },
            SegmentKey::Submarket { submarket },
        ];

        let mut widest = 0;
        let mut unseen = None;
        for segment in ladder {
            let count = self.comparable_count(&segment);
            widest = widest.max(count);
            if count < self.min_comparables {
                continue;
            }
            match self.unseen_level(&segment, covariates) {
                None => return Ok((segment, count)),
                Some((term, level)) => {
                    debug!(segment = %segment, term, level = %level, "level unseen in segment");
                    unseen.get_or_insert(UnresolvedReason::UnseenLevel {
                        term: term.to_string(),
                        level,
                    });
                }
            }
        }

        Err(ImputationOutcome::unresolved(
            unseen.unwrap_or(UnresolvedReason::InsufficientComparables),
            widest,
        ))
    }

    /// First categorical value of the subject that no comparable in the segment carries.
    fn unseen_level(
        &self,
        segment: &SegmentKey,
        covariates: &[CovariateValue],
    ) -> Option<(&'static str, String)> {
        let group = self.by_segment.get(segment).map(Vec::as_slice).unwrap_or(&[]);
        self.covariates
            .terms()
            .iter()
            .zip(covariates)
            .enumerate()
            .find_map(|(index, (term, value))| {
                let CovariateValue::Level(level) = value else {
                    return None;
                };
                let seen = group
                    .iter()
                    .any(|comparable| comparable.covariates.get(index) == Some(value));
                (!seen).then(|| (term.name, level.clone()))
            })
    }

    pub fn subject_covariates(&self, listing: &StrListing) -> Option<Vec<CovariateValue>> {
        Some(vec![
            property_type_level(listing.product_class()),
            CovariateValue::Level(listing.bed_bath()?),
            CovariateValue::Level(listing.suburb.clone()?),
            month_level(self.reference_month),
        ])
    }

    pub fn fit_segment(&self, segment: &SegmentKey) -> Result<RentModel, ModelError> {
        let group = self.by_segment.get(segment).map(Vec::as_slice).unwrap_or(&[]);
        if group.len() < self.min_comparables {
            return Err(ModelError::InsufficientRows {
                rows: group.len(),
                required: self.min_comparables,
            });
        }

        let rows: Vec<Vec<CovariateValue>> =
            group.iter().map(|comparable| comparable.covariates.clone()).collect();
        let response: Vec<f64> = group
            .iter()
            .map(|comparable| comparable.weekly_rent.ln())
            .collect();

        let layout = self.covariates.layout(&rows)?;
        let design = layout.matrix(&rows)?;
        let fit = fit_ols(&design, &response)?;

        debug!(
            segment = %segment,
            observations = fit.observations,
            rank = fit.rank,
            "fitted rent model"
        );

        Ok(RentModel {
            segment: segment.clone(),
            layout,
            fit,
        })
    }

    /// Resolves every subject, fits each needed segment once (in parallel), and predicts.
    pub fn impute(&self, listings: &[&StrListing]) -> ImputationRun {
        let resolutions: Vec<Result<Resolved, ImputationOutcome>> = listings
            .iter()
            .map(|listing| {
                let covariates = self.subject_covariates(listing).ok_or_else(|| {
                    ImputationOutcome::unresolved(UnresolvedReason::MissingCovariates, 0)
                })?;
                let (segment, count) = self.resolve(listing, &covariates)?;
                Ok(Resolved {
                    segment,
                    count,
                    covariates,
                })
            })
            .collect();

        let needed: Vec<SegmentKey> = resolutions
            .iter()
            .filter_map(|resolution| resolution.as_ref().ok().map(|found| found.segment.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let fitted: BTreeMap<SegmentKey, Result<RentModel, ModelError>> = needed
            .par_iter()
            .map(|segment| (segment.clone(), self.fit_segment(segment)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        let mut models = Vec::new();
        let mut failures = Vec::new();
        for (segment, result) in &fitted {
            match result {
                Ok(model) => models.push(model.summary()),
                Err(err) => {
                    warn!(segment = %segment, error = %err, "rent model fit failed");
                    failures.push(SegmentFailure {
                        segment: segment.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        let outcomes = resolutions
            .into_iter()
            .map(|resolution| {
                let Resolved {
                    segment,
                    count,
                    covariates,
                } = match resolution {
                    Ok(found) => found,
                    Err(outcome) => return outcome,
                };
                let model = match fitted.get(&segment) {
                    Some(Ok(model)) => model,
                    Some(Err(err)) => {
                        return ImputationOutcome::unresolved(
                            UnresolvedReason::FitFailed(err.to_string()),
                            count,
                        )
                    }
                    None => {
                        return ImputationOutcome::unresolved(
                            UnresolvedReason::NotAttempted,
                            count,
                        )
                    }
                };

                match model.predict(&covariates) {
                    Ok(weekly_rent) => ImputationOutcome {
                        tier: segment.tier(),
                        segment: Some(segment),
                        comparable_count: count,
                        weekly_rent: Some(weekly_rent),
                        reason: None,
                    },
                    Err(ModelError::UnseenLevel { term, level }) => {
                        let reason = UnresolvedReason::UnseenLevel {
                            term: term.to_string(),
                            level,
                        };
                        ImputationOutcome::unresolved(reason, count)
                    }
                    Err(err) => ImputationOutcome::unresolved(
                        UnresolvedReason::FitFailed(err.to_string()),
                        count,
                    ),
                }
            })
            .collect();

        ImputationRun {
            outcomes,
            models,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparable(
        id: usize,
        class: ProductClass,
        submarket: &str,
        suburb: &str,
        beds: u32,
        rent: f64,
    ) -> Comparable {
        Comparable {
            address_id: format!("A{id:04}"),
            product_class: class,
            submarket: submarket.to_string(),
            covariates: vec![
                property_type_level(class),
                CovariateValue::Level(bed_bath_label(beds, 1.0)),
                CovariateValue::Level(suburb.to_string()),
                month_level(1 + (id % 3) as u32),
            ],
            weekly_rent: rent,
        }
    }

    fn listing(id: &str, property_type: &str, submarket: Option<&str>) -> StrListing {
        StrListing {
            property_id: id.to_string(),
            host_id: "H1".to_string(),
            property_type: property_type.to_string(),
            bedrooms: Some(2),
            bathrooms: Some(1.0),
            max_guests: Some(4),
            min_stay: Some(2),
            cancellation_policy: Some("moderate".to_string()),
            suburb: Some("bondi".to_string()),
            submarket: submarket.map(str::to_string),
        }
    }

    fn corpus() -> Vec<Comparable> {
        let mut rows = Vec::new();
        for id in 0..12 {
            let beds = 1 + (id % 3) as u32;
            let suburb = if id % 2 == 0 { "bondi" } else { "coogee" };
            let rent = 400.0 + 120.0 * f64::from(beds) + if id % 2 == 0 { 50.0 } else { 0.0 };
            rows.push(comparable(id, ProductClass::Unit, "east", suburb, beds, rent));
        }
        for id in 12..15 {
            rows.push(comparable(id, ProductClass::House, "east", "bondi", 3, 900.0));
        }
        rows
    }

    fn config(min_comparables: usize) -> AnalysisConfig {
        AnalysisConfig {
            min_comparables,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn sufficient_segment_resolves_exactly() {
        let engine = RentImputationEngine::new(corpus(), &config(10));
        let subject = listing("L1", "apartment", Some("east"));
        let run = engine.impute(&[&subject]);

        let outcome = &run.outcomes[0];
        assert_eq!(outcome.tier, ResolutionTier::Exact);
        assert_eq!(outcome.comparable_count, 12);
        assert!(outcome.weekly_rent.expect("rent") > 0.0);
        assert_eq!(run.models.len(), 1);
    }

    #[test]
    fn thin_segment_falls_back_and_records_the_tier() {
        let engine = RentImputationEngine::new(corpus(), &config(10));
        let subject = listing("L2", "house", Some("east"));
        let run = engine.impute(&[&subject]);

        let outcome = &run.outcomes[0];
        assert_eq!(outcome.tier, ResolutionTier::Fallback);
        assert_ne!(outcome.tier, ResolutionTier::Exact);
        assert_eq!(
            outcome.segment,
            Some(SegmentKey::Submarket {
                submarket: "east".to_string()
            })
        );
        assert_eq!(outcome.comparable_count, 15);
    }

    #[test]
    fn no_tier_with_enough_comparables_is_unresolved() {
        let engine = RentImputationEngine::new(corpus(), &config(10));
        let subject = listing("L3", "apartment", Some("west"));
        let run = engine.impute(&[&subject]);

        let outcome = &run.outcomes[0];
        assert_eq!(outcome.tier, ResolutionTier::Unresolved);
        assert_eq!(outcome.weekly_rent, None);
        assert_eq!(
            outcome.reason,
            Some(UnresolvedReason::InsufficientComparables)
        );
        assert!(run.models.is_empty());

        let missing = listing("L4", "apartment", None);
        let run = engine.impute(&[&missing]);
        assert_eq!(
            run.outcomes[0].reason,
            Some(UnresolvedReason::MissingCovariates)
        );
    }

    #[test]
    fn predictions_are_identical_under_comparable_permutation() {
        let subject = listing("L1", "apartment", Some("east"));
        let forward = RentImputationEngine::new(corpus(), &config(10)).impute(&[&subject]);

        let mut reversed = corpus();
        reversed.reverse();
        let backward = RentImputationEngine::new(reversed, &config(10)).impute(&[&subject]);

        let a = forward.outcomes[0].weekly_rent.expect("rent");
        let b = backward.outcomes[0].weekly_rent.expect("rent");
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn prediction_is_the_exponentiated_log_fit() {
        let comparables: Vec<Comparable> = (0..6)
            .map(|id| comparable(id, ProductClass::Unit, "east", "bondi", 2, 500.0))
            .collect();
        let engine = RentImputationEngine::new(comparables, &config(5));
        let subject = listing("L1", "apartment", Some("east"));
        let run = engine.impute(&[&subject]);
        let rent = run.outcomes[0].weekly_rent.expect("rent");
        assert!((rent - 500.0).abs() < 1e-6);
    }

    #[test]
    fn subject_in_an_unseen_suburb_is_not_priced_as_the_baseline() {
        let mut comparables = Vec::new();
        for id in 0..5 {
            comparables.push(comparable(id, ProductClass::Unit, "east", "bondi", 2, 300.0));
        }
        for id in 5..10 {
            comparables.push(comparable(id, ProductClass::Unit, "east", "toorak", 2, 1500.0));
        }
        let engine = RentImputationEngine::new(comparables, &config(5));
        let mut subject = listing("L9", "apartment", Some("east"));
        subject.suburb = Some("zetland".to_string());

        let run = engine.impute(&[&subject]);
        let outcome = &run.outcomes[0];
        assert_eq!(outcome.tier, ResolutionTier::Unresolved);
        assert_eq!(outcome.weekly_rent, None);
        assert_eq!(outcome.comparable_count, 10);
        assert_eq!(
            outcome.reason,
            Some(UnresolvedReason::UnseenLevel {
                term: "suburb".to_string(),
                level: "zetland".to_string(),
            })
        );
        assert!(run.models.is_empty());
    }

    #[test]
    fn exact_segment_missing_a_level_drops_to_the_submarket() {
        let mut comparables: Vec<Comparable> = (0..6)
            .map(|id| comparable(id, ProductClass::Unit, "east", "bondi", 1, 450.0))
            .collect();
        comparables.push(comparable(6, ProductClass::House, "east", "bondi", 2, 800.0));
        let engine = RentImputationEngine::new(comparables, &config(5));
        let subject = listing("L5", "apartment", Some("east"));

        let run = engine.impute(&[&subject]);
        let outcome = &run.outcomes[0];
        assert_eq!(outcome.tier, ResolutionTier::Fallback);
        assert_eq!(outcome.comparable_count, 7);
        assert!(outcome.weekly_rent.is_some());
    }

    #[test]
    fn free_text_property_types_share_the_class_level() {
        let comparables: Vec<Comparable> = (0..6)
            .map(|id| comparable(id, ProductClass::Unit, "east", "bondi", 2, 500.0))
            .collect();
        let engine = RentImputationEngine::new(comparables, &config(5));
        let subject = listing("L6", "entire apartment", Some("east"));

        let run = engine.impute(&[&subject]);
        assert_eq!(run.outcomes[0].tier, ResolutionTier::Exact);
    }
}
