mod engine;
mod segment;

pub use engine::{
    comparables_from, rent_covariates, Comparable, ImputationRun, RentImputationEngine,
    RentModel, RentModelSummary, SegmentFailure,
};
pub use segment::{ImputationOutcome, ResolutionTier, SegmentKey, UnresolvedReason};
