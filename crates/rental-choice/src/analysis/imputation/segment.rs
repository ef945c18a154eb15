use crate::analysis::domain::ProductClass;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far down the fallback ladder a subject had to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    Exact,
    Fallback,
    Unresolved,
}

impl ResolutionTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exact => "Exact",
            Self::Fallback => "Fallback",
            Self::Unresolved => "Unresolved",
        }
    }
}

/// Comparable-property grouping that scopes one rent model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentKey {
    /// Product class within a submarket.
    Exact {
        product_class: ProductClass,
        submarket: String,
    },
    /// Whole submarket, product class ignored.
    Submarket { submarket: String },
}

impl SegmentKey {
    pub fn tier(&self) -> ResolutionTier {
        match self {
            SegmentKey::Exact { .. } => ResolutionTier::Exact,
            SegmentKey::Submarket { .. } => ResolutionTier::Fallback,
        }
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentKey::Exact {
                product_class,
                submarket,
            } => write!(f, "{} / {}", product_class.label(), submarket),
            SegmentKey::Submarket { submarket } => write!(f, "* / {}", submarket),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    NotAttempted,
    MissingCovariates,
    InsufficientComparables,
    /// Every segment with enough comparables lacks one of the subject's levels.
    UnseenLevel {
        term: String,
        level: String,
    },
    FitFailed(String),
}

/// Imputation result recorded on every short-term property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationOutcome {
    pub tier: ResolutionTier,
    pub segment: Option<SegmentKey>,
    /// Comparables in the chosen segment, or in the widest segment tried when unresolved.
    pub comparable_count: usize,
    /// Predicted weekly rent, back-transformed without bias correction.
    pub weekly_rent: Option<f64>,
    pub reason: Option<UnresolvedReason>,
}

impl ImputationOutcome {
    pub fn not_attempted() -> Self {
        Self::unresolved(UnresolvedReason::NotAttempted, 0)
    }

    pub fn unresolved(reason: UnresolvedReason, comparable_count: usize) -> Self {
        Self {
            tier: ResolutionTier::Unresolved,
            segment: None,
            comparable_count,
            weekly_rent: None,
            reason: Some(reason),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.tier != ResolutionTier::Unresolved && self.weekly_rent.is_some()
    }
}
