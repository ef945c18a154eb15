use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Booked,
    Blocked,
    Available,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Booked => "Booked",
            Self::Blocked => "Blocked",
            Self::Available => "Available",
        }
    }

    /// Accepts the single-letter ledger codes (`R`, `B`, `A`) as well as full words.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "r" | "reserved" | "booked" => Some(Self::Booked),
            "b" | "blocked" => Some(Self::Blocked),
            "a" | "available" => Some(Self::Available),
            _ => None,
        }
    }
}

/// One calendar day of one listing, as recorded by the booking ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub property_id: String,
    pub date: NaiveDate,
    pub status: BookingStatus,
    pub price: Option<f64>,
    pub booking_date: Option<NaiveDate>,
}

/// Half-open date range `[start, end)` the summarizer restricts itself to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ObservationWindow {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self {
            start,
            end: start + chrono::Duration::days(i64::from(days)),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}
