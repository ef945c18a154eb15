use chrono::{Datelike, NaiveDate};
use clap::Args;
use rental_choice::config::{AnalysisConfig, AppConfig};
use rental_choice::error::AppError;
use rental_choice::telemetry;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Flags that override individual environment settings.
#[derive(Args, Debug, Default)]
pub(crate) struct ConfigOverrides {
    /// First day of the observation window (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) window_start: Option<NaiveDate>,
    /// Observation window length in days
    #[arg(long)]
    pub(crate) window_days: Option<u32>,
    /// Guest cost per person per day
    #[arg(long)]
    pub(crate) cpppd: Option<f64>,
    /// Persons per bedroom
    #[arg(long)]
    pub(crate) persons_per_bedroom: Option<f64>,
    /// Minimum comparables a segment needs before a rent model is fitted
    #[arg(long)]
    pub(crate) min_comparables: Option<usize>,
    /// Multiplier converting nightly rates into the long-term currency
    #[arg(long)]
    pub(crate) exchange_rate: Option<f64>,
    /// Calendar month (1-12) used when predicting rents
    #[arg(long)]
    pub(crate) reference_month: Option<u32>,
    /// Worker shards for the ledger summarizer
    #[arg(long)]
    pub(crate) shards: Option<usize>,
}

impl ConfigOverrides {
    /// `month_pinned` keeps an env-supplied reference month when only the window moves.
    fn apply(&self, config: &mut AnalysisConfig, month_pinned: bool) {
        if let Some(window_start) = self.window_start {
            config.window_start = window_start;
            if self.reference_month.is_none() && !month_pinned {
                config.reference_month = window_start.month();
            }
        }
        if let Some(days) = self.window_days {
            config.window_days = days;
        }
        if let Some(cpppd) = self.cpppd {
            config.cost_per_person_per_day = cpppd;
        }
        if let Some(g) = self.persons_per_bedroom {
            config.persons_per_bedroom = g;
        }
        if let Some(min) = self.min_comparables {
            config.min_comparables = min;
        }
        if let Some(rate) = self.exchange_rate {
            config.exchange_rate = rate;
        }
        if let Some(month) = self.reference_month {
            config.reference_month = month;
        }
        if let Some(shards) = self.shards {
            config.shards = shards;
        }
    }
}

/// Loads env configuration, applies CLI overrides and installs tracing.
pub(crate) fn bootstrap(overrides: &ConfigOverrides) -> Result<AnalysisConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let mut analysis = config.analysis;
    overrides.apply(&mut analysis, config.reference_month_pinned);
    analysis.validate()?;
    Ok(analysis)
}

/// Writes `value` as JSON to `output`, or stdout when no path is given.
pub(crate) fn write_json<T: Serialize>(
    value: &T,
    output: Option<&Path>,
    pretty: bool,
) -> Result<(), AppError> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[derive(Args, Debug, Default)]
pub(crate) struct OutputArgs {
    /// Destination file; stdout when omitted
    #[arg(long, short)]
    pub(crate) output: Option<PathBuf>,
    /// Pretty-print the JSON
    #[arg(long)]
    pub(crate) pretty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_supplied_values() {
        let mut config = AnalysisConfig::default();
        let overrides = ConfigOverrides {
            window_start: Some(parse_date("2016-04-01").expect("date")),
            min_comparables: Some(10),
            ..ConfigOverrides::default()
        };
        overrides.apply(&mut config, false);

        assert_eq!(config.reference_month, 4);
        assert_eq!(config.min_comparables, 10);
        assert_eq!(config.window_days, 366);
    }

    #[test]
    fn window_start_keeps_a_pinned_reference_month() {
        let mut config = AnalysisConfig {
            reference_month: 9,
            ..AnalysisConfig::default()
        };
        let overrides = ConfigOverrides {
            window_start: Some(parse_date("2016-04-01").expect("date")),
            ..ConfigOverrides::default()
        };
        overrides.apply(&mut config, true);
        assert_eq!(config.window_start, parse_date("2016-04-01").expect("date"));
        assert_eq!(config.reference_month, 9);

        let explicit = ConfigOverrides {
            reference_month: Some(2),
            ..overrides
        };
        explicit.apply(&mut config, true);
        assert_eq!(config.reference_month, 2);
    }

    #[test]
    fn parse_date_reports_the_raw_value() {
        let err = parse_date("04/01/2016").expect_err("not iso");
        assert!(err.contains("04/01/2016"));
    }
}
