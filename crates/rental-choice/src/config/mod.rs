use chrono::{Datelike, NaiveDate};
use std::env;
use std::fmt;

use crate::analysis::hosts::HostRuleThresholds;

/// Top-level configuration for a batch run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub telemetry: TelemetryConfig,
    /// True when `RC_REFERENCE_MONTH` was set rather than derived from the window start.
    pub reference_month_pinned: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = AnalysisConfig::default();

        let window_start = match env::var("RC_WINDOW_START") {
            Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|source| {
                ConfigError::InvalidDate {
                    key: "RC_WINDOW_START",
                    value: raw.clone(),
                    source,
                }
            })?,
            Err(_) => defaults.window_start,
        };

        let pinned = env::var("RC_REFERENCE_MONTH").is_ok();
        let reference_month = match env::var("RC_REFERENCE_MONTH") {
            Ok(raw) => {
                let month = parse_var::<u32>("RC_REFERENCE_MONTH", &raw)?;
                if !(1..=12).contains(&month) {
                    return Err(ConfigError::OutOfRange {
                        key: "RC_REFERENCE_MONTH",
                        value: raw,
                    });
                }
                month
            }
            Err(_) => window_start.month(),
        };

        let analysis = AnalysisConfig {
            window_start,
            window_days: var_or("RC_WINDOW_DAYS", defaults.window_days)?,
            year_length: var_or("RC_YEAR_LENGTH", defaults.year_length)?,
            cost_per_person_per_day: var_or("RC_CPPPD", defaults.cost_per_person_per_day)?,
            persons_per_bedroom: var_or(
                "RC_PERSONS_PER_BEDROOM",
                defaults.persons_per_bedroom,
            )?,
            min_comparables: var_or("RC_MIN_COMPARABLES", defaults.min_comparables)?,
            exchange_rate: var_or("RC_EXCHANGE_RATE", defaults.exchange_rate)?,
            ltr_periods_per_year: var_or(
                "RC_LTR_PERIODS_PER_YEAR",
                defaults.ltr_periods_per_year,
            )?,
            reference_month,
            shards: var_or("RC_SHARDS", defaults.shards)?,
            host_rules: HostRuleThresholds {
                multi_platform_blocks_per_year: var_or(
                    "RC_MULTI_PLATFORM_BLOCKS",
                    defaults.host_rules.multi_platform_blocks_per_year,
                )?,
                profit_seeker_max_block_rate: var_or(
                    "RC_PROFIT_SEEKER_MAX_BLOCK_RATE",
                    defaults.host_rules.profit_seeker_max_block_rate,
                )?,
                opportunistic_min_block_rate: var_or(
                    "RC_OPPORTUNISTIC_MIN_BLOCK_RATE",
                    defaults.host_rules.opportunistic_min_block_rate,
                )?,
            },
        };
        analysis.validate()?;

        let log_level = env::var("RC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            analysis,
            telemetry: TelemetryConfig { log_level },
            reference_month_pinned: pinned,
        })
    }
}

/// Parameters threaded through every analysis stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// First day of the observation window.
    pub window_start: NaiveDate,
    /// Window length in days; the window is `[window_start, window_start + window_days)`.
    pub window_days: u32,
    /// Days in the extrapolation year (`Y`).
    pub year_length: f64,
    /// Guest cost per person per day (`cpppd`), in the long-term currency.
    pub cost_per_person_per_day: f64,
    /// Persons per bedroom (`g`).
    pub persons_per_bedroom: f64,
    /// Minimum comparable count a segment needs before a rent model is fitted.
    pub min_comparables: usize,
    /// Multiplier converting nightly rates into the long-term currency.
    pub exchange_rate: f64,
    /// Rent periods per year; long-term rents are quoted weekly.
    pub ltr_periods_per_year: f64,
    /// Calendar month (1-12) used for the month fixed effect when predicting.
    pub reference_month: u32,
    /// Number of worker shards for the summarizer.
    pub shards: usize,
    pub host_rules: HostRuleThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let window_start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap_or_default();
        Self {
            window_start,
            window_days: 366,
            year_length: 365.0,
            cost_per_person_per_day: 4.5,
            persons_per_bedroom: 1.5,
            min_comparables: 30,
            exchange_rate: 1.0,
            ltr_periods_per_year: 52.0,
            reference_month: window_start.month(),
            shards: 8,
            host_rules: HostRuleThresholds::default(),
        }
    }
}

impl AnalysisConfig {
    /// Exclusive upper bound of the observation window.
    pub fn window_end(&self) -> NaiveDate {
        self.window_start + chrono::Duration::days(i64::from(self.window_days))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_days == 0 {
            return Err(ConfigError::OutOfRange {
                key: "RC_WINDOW_DAYS",
                value: self.window_days.to_string(),
            });
        }
        if self.year_length.is_nan() || self.year_length <= 0.0 {
            return Err(ConfigError::OutOfRange {
                key: "RC_YEAR_LENGTH",
                value: self.year_length.to_string(),
            });
        }
        if self.exchange_rate.is_nan() || self.exchange_rate <= 0.0 {
            return Err(ConfigError::OutOfRange {
                key: "RC_EXCHANGE_RATE",
                value: self.exchange_rate.to_string(),
            });
        }
        if self.min_comparables == 0 {
            return Err(ConfigError::OutOfRange {
                key: "RC_MIN_COMPARABLES",
                value: "0".to_string(),
            });
        }
        if !(1..=12).contains(&self.reference_month) {
            return Err(ConfigError::OutOfRange {
                key: "RC_REFERENCE_MONTH",
                value: self.reference_month.to_string(),
            });
        }
        if self.shards == 0 {
            return Err(ConfigError::OutOfRange {
                key: "RC_SHARDS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn var_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => parse_var(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
    },
    InvalidDate {
        key: &'static str,
        value: String,
        source: chrono::ParseError,
    },
    OutOfRange {
        key: &'static str,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an unparseable value '{value}'")
            }
            ConfigError::InvalidDate { key, value, .. } => {
                write!(f, "{key} must be a YYYY-MM-DD date, got '{value}'")
            }
            ConfigError::OutOfRange { key, value } => {
                write!(f, "{key} is out of range: '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidDate { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } | ConfigError::OutOfRange { .. } => None,
        }
    }
}
