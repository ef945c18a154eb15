use super::domain::{BookingStatus, DailyObservation, ObservationWindow};
use super::runs::blocked_runs;
use crate::analysis::stats::{median, median_u32};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Booking-history statistics for one listing over the observation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub property_id: String,
    pub total_days: u32,
    pub bookings: u32,
    pub block_days: u32,
    pub block_rate: f64,
    pub avail_rate: f64,
    pub occ_rate: f64,
    /// Median nightly price over booked days that carried a price.
    pub med_rate: Option<f64>,
    pub nbr_block: u32,
    pub med_block_len: Option<f64>,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

impl PropertySummary {
    /// Blocked periods per year, normalised by the number of observed days.
    pub fn blocks_per_year(&self, year_length: f64) -> f64 {
        if self.total_days == 0 {
            return 0.0;
        }
        f64::from(self.nbr_block) / f64::from(self.total_days) * year_length
    }
}

/// Summarises every row of a single listing. Rows for other listings must not be passed.
///
/// Returns `None` when nothing falls inside the window.
pub fn summarize_property(
    property_id: &str,
    rows: &[DailyObservation],
    window: &ObservationWindow,
) -> Option<PropertySummary> {
    // keep-first per date, in ledger order
    let mut calendar: BTreeMap<NaiveDate, &DailyObservation> = BTreeMap::new();
    for row in rows.iter().filter(|row| window.contains(row.date)) {
        calendar.entry(row.date).or_insert(row);
    }

    let first_date = *calendar.keys().next()?;
    let last_date = *calendar.keys().next_back()?;

    let total_days = calendar.len() as u32;
    let mut bookings = 0u32;
    let mut block_days = 0u32;
    let mut avail_days = 0u32;
    let mut booked_prices = Vec::new();

    for row in calendar.values() {
        match row.status {
            BookingStatus::Booked => {
                bookings += 1;
                if let Some(price) = row.price.filter(|price| price.is_finite()) {
                    booked_prices.push(price);
                }
            }
            BookingStatus::Blocked => block_days += 1,
            BookingStatus::Available => avail_days += 1,
        }
    }

    let sequence: Vec<(NaiveDate, BookingStatus)> = calendar
        .iter()
        .map(|(date, row)| (*date, row.status))
        .collect();
    let runs = blocked_runs(&sequence);

    let days = f64::from(total_days);
    let block_rate = f64::from(block_days) / days;
    let avail_rate = f64::from(avail_days) / days;

    Some(PropertySummary {
        property_id: property_id.to_string(),
        total_days,
        bookings,
        block_days,
        block_rate,
        avail_rate,
        occ_rate: 1.0 - block_rate - avail_rate,
        med_rate: median(&booked_prices),
        nbr_block: runs.len() as u32,
        med_block_len: median_u32(&runs),
        first_date,
        last_date,
    })
}

/// Groups a shard of ledger rows by listing and summarises each listing.
pub(crate) fn summarize_shard(
    rows: Vec<DailyObservation>,
    window: &ObservationWindow,
) -> Vec<PropertySummary> {
    let mut by_property: BTreeMap<String, Vec<DailyObservation>> = BTreeMap::new();
    for row in rows {
        by_property
            .entry(row.property_id.clone())
            .or_default()
            .push(row);
    }

    by_property
        .iter()
        .filter_map(|(property_id, rows)| summarize_property(property_id, rows, window))
        .collect()
}
