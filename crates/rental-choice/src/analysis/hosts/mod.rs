//! Host segmentation and per-segment preference models.

mod preference;
mod rules;

pub use preference::{
    fit_preference_models, preference_covariates, PreferenceFailure, PreferenceModelSummary,
    PreferenceModels, PreferenceOutcome,
};
pub use rules::{HostRuleThresholds, HostSignals, HostType};

use crate::analysis::calendar::PropertySummary;
use crate::config::AnalysisConfig;

/// Stateless classifier applying the ordered rule table.
pub struct HostClassifier {
    thresholds: HostRuleThresholds,
    year_length: f64,
}

impl HostClassifier {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            thresholds: config.host_rules,
            year_length: config.year_length,
        }
    }

    pub fn classify(&self, summary: &PropertySummary) -> HostType {
        self.classify_signals(&HostSignals::from_summary(summary, self.year_length))
            .0
    }

    /// Final type plus the rules that fired, in evaluation order.
    pub fn classify_signals(&self, signals: &HostSignals) -> (HostType, Vec<&'static str>) {
        rules::apply_rules(signals, &self.thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> HostClassifier {
        HostClassifier::new(&AnalysisConfig::default())
    }

    fn signals(block_rate: f64, blocks_per_year: f64) -> HostSignals {
        HostSignals {
            block_rate,
            blocks_per_year,
        }
    }

    #[test]
    fn block_rate_boundaries_are_inclusive() {
        let classifier = classifier();
        assert_eq!(
            classifier.classify_signals(&signals(0.25, 0.0)).0,
            HostType::ProfitSeeker
        );
        assert_eq!(
            classifier.classify_signals(&signals(0.75, 0.0)).0,
            HostType::OpportunisticSharer
        );
        assert_eq!(
            classifier.classify_signals(&signals(0.5, 12.0)).0,
            HostType::Unknown
        );
    }

    #[test]
    fn frequent_blocking_needs_more_than_twelve_periods() {
        let classifier = classifier();
        assert_eq!(
            classifier.classify_signals(&signals(0.5, 12.5)).0,
            HostType::MultiPlatformUser
        );
    }

    #[test]
    fn later_rules_overwrite_earlier_assignments() {
        let (host_type, fired) = classifier().classify_signals(&signals(0.1, 40.0));
        assert_eq!(host_type, HostType::ProfitSeeker);
        assert_eq!(fired, vec!["frequent_blocking", "rarely_blocked"]);

        let (host_type, fired) = classifier().classify_signals(&signals(0.9, 40.0));
        assert_eq!(host_type, HostType::OpportunisticSharer);
        assert_eq!(fired, vec!["frequent_blocking", "mostly_blocked"]);
    }

    #[test]
    fn thresholds_come_from_config() {
        let config = AnalysisConfig {
            host_rules: HostRuleThresholds {
                profit_seeker_max_block_rate: 0.1,
                ..HostRuleThresholds::default()
            },
            ..AnalysisConfig::default()
        };
        let classifier = HostClassifier::new(&config);
        assert_eq!(
            classifier.classify_signals(&signals(0.2, 0.0)).0,
            HostType::Unknown
        );
    }
}
