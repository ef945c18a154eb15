use crate::analysis::calendar::PropertySummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostType {
    ProfitSeeker,
    OpportunisticSharer,
    MultiPlatformUser,
    Unknown,
}

impl HostType {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::ProfitSeeker,
            Self::OpportunisticSharer,
            Self::MultiPlatformUser,
            Self::Unknown,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ProfitSeeker => "Profit seeker",
            Self::OpportunisticSharer => "Opportunistic sharer",
            Self::MultiPlatformUser => "Multi-platform user",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostRuleThresholds {
    /// Blocked periods per year above which a host is assumed to list elsewhere too.
    pub multi_platform_blocks_per_year: f64,
    pub profit_seeker_max_block_rate: f64,
    pub opportunistic_min_block_rate: f64,
}

impl Default for HostRuleThresholds {
    fn default() -> Self {
        Self {
            multi_platform_blocks_per_year: 12.0,
            profit_seeker_max_block_rate: 0.25,
            opportunistic_min_block_rate: 0.75,
        }
    }
}

/// Inputs the rule table reads from a summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostSignals {
    pub block_rate: f64,
    pub blocks_per_year: f64,
}

impl HostSignals {
    pub fn from_summary(summary: &PropertySummary, year_length: f64) -> Self {
        Self {
            block_rate: summary.block_rate,
            blocks_per_year: summary.blocks_per_year(year_length),
        }
    }
}

pub(crate) struct HostRule {
    pub name: &'static str,
    pub assigns: HostType,
    pub matches: fn(&HostSignals, &HostRuleThresholds) -> bool,
}

fn frequent_blocking(signals: &HostSignals, thresholds: &HostRuleThresholds) -> bool {
    signals.blocks_per_year > thresholds.multi_platform_blocks_per_year
}

fn rarely_blocked(signals: &HostSignals, thresholds: &HostRuleThresholds) -> bool {
    signals.block_rate <= thresholds.profit_seeker_max_block_rate
}

fn mostly_blocked(signals: &HostSignals, thresholds: &HostRuleThresholds) -> bool {
    signals.block_rate >= thresholds.opportunistic_min_block_rate
}

/// Evaluated in order; every matching rule overwrites the previous assignment.
pub(crate) const HOST_RULES: [HostRule; 3] = [
    HostRule {
        name: "frequent_blocking",
        assigns: HostType::MultiPlatformUser,
        matches: frequent_blocking,
    },
    HostRule {
        name: "rarely_blocked",
        assigns: HostType::ProfitSeeker,
        matches: rarely_blocked,
    },
    HostRule {
        name: "mostly_blocked",
        assigns: HostType::OpportunisticSharer,
        matches: mostly_blocked,
    },
];

/// Runs the rule table, returning the final type and the names of every rule that fired.
pub(crate) fn apply_rules(
    signals: &HostSignals,
    thresholds: &HostRuleThresholds,
) -> (HostType, Vec<&'static str>) {
    let mut host_type = HostType::Unknown;
    let mut fired = Vec::new();
    for rule in &HOST_RULES {
        if (rule.matches)(signals, thresholds) {
            host_type = rule.assigns;
            fired.push(rule.name);
        }
    }
    (host_type, fired)
}
