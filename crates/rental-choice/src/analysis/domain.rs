use super::calendar::PropertySummary;
use super::hosts::HostType;
use super::imputation::ImputationOutcome;
use super::revenue::{PreferenceFlags, RevenueFigures};
use serde::{Deserialize, Serialize};

/// Coarse product grouping shared by short-term listings and long-term adverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductClass {
    House,
    Unit,
    Other,
}

const HOUSE_KEYWORDS: [&str; 7] = [
    "house", "villa", "cottage", "terrace", "duplex", "bungalow", "cabin",
];
const UNIT_KEYWORDS: [&str; 7] = [
    "apartment", "unit", "flat", "condo", "studio", "loft", "penthouse",
];

impl ProductClass {
    pub const fn label(self) -> &'static str {
        match self {
            Self::House => "House",
            Self::Unit => "Unit",
            Self::Other => "Other",
        }
    }

    pub fn classify(property_type: &str) -> Self {
        let lowered = property_type.to_ascii_lowercase();
        if HOUSE_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
            Self::House
        } else if UNIT_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
            Self::Unit
        } else {
            Self::Other
        }
    }
}

/// Categorical bed/bath configuration, e.g. `2bd/1.5ba`.
///
/// Bedrooms cap at `4+` and bathrooms round to the nearest half and cap at `3+`.
pub fn bed_bath_label(bedrooms: u32, bathrooms: f64) -> String {
    let beds = if bedrooms >= 4 {
        "4+".to_string()
    } else {
        bedrooms.to_string()
    };

    let rounded = (bathrooms.max(0.0) * 2.0).round() / 2.0;
    let baths = if rounded >= 3.0 {
        "3+".to_string()
    } else {
        rounded.to_string()
    };

    format!("{beds}bd/{baths}ba")
}

/// Attributes of a short-term listing as supplied by the listing export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrListing {
    pub property_id: String,
    pub host_id: String,
    pub property_type: String,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub max_guests: Option<u32>,
    pub min_stay: Option<u32>,
    pub cancellation_policy: Option<String>,
    pub suburb: Option<String>,
    pub submarket: Option<String>,
}

impl StrListing {
    pub fn product_class(&self) -> ProductClass {
        ProductClass::classify(&self.property_type)
    }

    pub fn bed_bath(&self) -> Option<String> {
        Some(bed_bath_label(self.bedrooms?, self.bathrooms?))
    }

    /// Guest capacity per bedroom; studios count as one bedroom.
    pub fn guests_per_bedroom(&self) -> Option<f64> {
        let guests = f64::from(self.max_guests?);
        let bedrooms = f64::from(self.bedrooms?.max(1));
        Some(guests / bedrooms)
    }
}

/// A short-term listing enriched stage by stage through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrProperty {
    #[serde(flatten)]
    pub listing: StrListing,
    pub summary: PropertySummary,
    #[serde(flatten)]
    pub revenue: RevenueFigures,
    pub imputation: ImputationOutcome,
    pub ltr_imp_revenue: Option<f64>,
    #[serde(flatten)]
    pub preferences: PreferenceFlags,
    pub host_type: HostType,
}

impl StrProperty {
    pub fn new(listing: StrListing, summary: PropertySummary) -> Self {
        Self {
            listing,
            summary,
            revenue: RevenueFigures::default(),
            imputation: ImputationOutcome::not_attempted(),
            ltr_imp_revenue: None,
            preferences: PreferenceFlags::default(),
            host_type: HostType::Unknown,
        }
    }

    pub fn property_id(&self) -> &str {
        &self.listing.property_id
    }
}
