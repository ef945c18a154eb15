//! Short-term revenue estimates and the comparison against imputed long-term revenue.

use super::calendar::PropertySummary;
use super::domain::StrListing;
use super::imputation::ImputationOutcome;
use crate::config::AnalysisConfig;
use serde::{Deserialize, Serialize};

/// Annual revenue estimates in the long-term currency. Negative values are valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueFigures {
    /// Observed over the tracked days.
    pub act_revenue: Option<f64>,
    /// Observed, extrapolated to a full year.
    pub lik_revenue: Option<f64>,
    /// If every non-blocked day were occupied at the extrapolated rate.
    pub pot_revenue: Option<f64>,
    pub potential_occupancy: Option<f64>,
}

/// Whether each revenue figure beats the long-term counterfactual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceFlags {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub act_pref: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lik_pref: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pot_pref: Option<bool>,
}

pub struct RevenueCalculator {
    cost_per_person_per_day: f64,
    persons_per_bedroom: f64,
    year_length: f64,
    exchange_rate: f64,
    ltr_periods_per_year: f64,
}

impl RevenueCalculator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            cost_per_person_per_day: config.cost_per_person_per_day,
            persons_per_bedroom: config.persons_per_bedroom,
            year_length: config.year_length,
            exchange_rate: config.exchange_rate,
            ltr_periods_per_year: config.ltr_periods_per_year,
        }
    }

    pub fn figures(&self, listing: &StrListing, summary: &PropertySummary) -> RevenueFigures {
        let (Some(med_rate), Some(bedrooms)) = (summary.med_rate, listing.bedrooms) else {
            return RevenueFigures::default();
        };
        if summary.total_days == 0 {
            return RevenueFigures::default();
        }

        let rate = med_rate * self.exchange_rate;
        let avg_guests = f64::from(bedrooms) * self.persons_per_bedroom;
        let guest_cost = avg_guests * self.cost_per_person_per_day;
        let bookings = f64::from(summary.bookings);
        let year = self.year_length;

        let act_revenue = bookings * rate - bookings * guest_cost;

        let extr = year / f64::from(summary.total_days);
        let lik_revenue = bookings * extr * rate - bookings * guest_cost * extr;

        let open_days = year - year * summary.block_rate;
        let potential_occupancy = (open_days > 0.0).then(|| (bookings * extr) / open_days);
        let pot_revenue = potential_occupancy
            .map(|occupancy| occupancy * year * rate - occupancy * year * guest_cost);

        RevenueFigures {
            act_revenue: Some(act_revenue),
            lik_revenue: Some(lik_revenue),
            pot_revenue,
            potential_occupancy,
        }
    }

    /// Annual long-term revenue from an imputed weekly rent.
    pub fn ltr_revenue(&self, outcome: &ImputationOutcome) -> Option<f64> {
        if !outcome.is_resolved() {
            return None;
        }
        outcome
            .weekly_rent
            .map(|rent| rent * self.ltr_periods_per_year)
    }

    /// A flag is set only when both sides of the comparison exist.
    pub fn preferences(
        &self,
        figures: &RevenueFigures,
        ltr_imp_revenue: Option<f64>,
    ) -> PreferenceFlags {
        let Some(ltr) = ltr_imp_revenue else {
            return PreferenceFlags::default();
        };
        let beats = |revenue: Option<f64>| revenue.map(|value| value > ltr);
        PreferenceFlags {
            act_pref: beats(figures.act_revenue),
            lik_pref: beats(figures.lik_revenue),
            pot_pref: beats(figures.pot_revenue),
        }
    }
}
