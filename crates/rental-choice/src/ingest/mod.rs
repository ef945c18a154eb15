//! CSV importers for the booking ledger, listing attributes and long-term snapshots.
//!
//! Rows that cannot be used are dropped and counted, never fatal. Ragged rows and
//! fields that are not UTF-8 count as malformed. Only I/O failures abort an import.

mod dates;
mod normalizer;
mod parser;

use crate::analysis::calendar::DailyObservation;
use crate::analysis::domain::StrListing;
use crate::analysis::reconcile::PropertySnapshot;
use parser::{DateTally, IntoRecord, LedgerRow, ListingRow, SnapshotRow};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {source_name}: {error}")]
    Io {
        source_name: &'static str,
        #[source]
        error: std::io::Error,
    },
    #[error("invalid CSV in {source_name}: {error}")]
    Csv {
        source_name: &'static str,
        #[source]
        error: csv::Error,
    },
}

/// Why a row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DropReason {
    MissingIdentifier,
    UnparseableDate,
    UnknownStatus,
    MalformedRow,
}

impl DropReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MissingIdentifier => "missing_identifier",
            Self::UnparseableDate => "unparseable_date",
            Self::UnknownStatus => "unknown_status",
            Self::MalformedRow => "malformed_row",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub source: &'static str,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub dropped: BTreeMap<&'static str, usize>,
    /// Dates recovered from a non-ISO layout.
    pub repaired_dates: usize,
    /// Optional dates that could not be parsed and were cleared.
    pub discarded_dates: usize,
}

impl IngestReport {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn dropped_for(&self, reason: DropReason) -> usize {
        self.dropped.get(reason.label()).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct Imported<T> {
    pub records: Vec<T>,
    pub report: IngestReport,
}

fn import<R, Row>(reader: R, source: &'static str) -> Result<Imported<Row::Record>, IngestError>
where
    R: Read,
    Row: IntoRecord + DeserializeOwned,
{
    let mut csv_reader = parser::csv_reader(reader);
    let mut report = IngestReport {
        source,
        ..IngestReport::default()
    };
    let mut records = Vec::new();
    let mut dates = DateTally::default();

    for row in csv_reader.deserialize::<Row>() {
        let row = match row {
            Ok(row) => row,
            Err(error) if error.is_io_error() => {
                return Err(IngestError::Csv {
                    source_name: source,
                    error,
                })
            }
            Err(error) => {
                debug!(source, %error, "malformed row");
                report.rows_read += 1;
                *report.dropped.entry(DropReason::MalformedRow.label()).or_default() += 1;
                continue;
            }
        };
        report.rows_read += 1;
        match row.into_record(&mut dates) {
            Ok(record) => records.push(record),
            Err(reason) => *report.dropped.entry(reason.label()).or_default() += 1,
        }
    }

    report.rows_kept = records.len();
    report.repaired_dates = dates.repaired;
    report.discarded_dates = dates.discarded;

    if report.dropped_total() > 0 {
        warn!(
            source,
            dropped = report.dropped_total(),
            "dropped unusable rows"
        );
    }
    info!(
        source,
        rows = report.rows_read,
        kept = report.rows_kept,
        repaired_dates = report.repaired_dates,
        "imported csv"
    );

    Ok(Imported { records, report })
}

fn open(path: &Path, source: &'static str) -> Result<std::fs::File, IngestError> {
    std::fs::File::open(path).map_err(|error| IngestError::Io {
        source_name: source,
        error,
    })
}

/// Daily booking ledger: `property_id,date,status,price,booking_date`.
pub struct LedgerImporter;

impl LedgerImporter {
    const SOURCE: &'static str = "ledger";

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Imported<DailyObservation>, IngestError> {
        Self::from_reader(open(path.as_ref(), Self::SOURCE)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Imported<DailyObservation>, IngestError> {
        import::<R, LedgerRow>(reader, Self::SOURCE)
    }
}

/// Short-term listing attributes.
pub struct ListingImporter;

impl ListingImporter {
    const SOURCE: &'static str = "listings";

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Imported<StrListing>, IngestError> {
        Self::from_reader(open(path.as_ref(), Self::SOURCE)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Imported<StrListing>, IngestError> {
        import::<R, ListingRow>(reader, Self::SOURCE)
    }
}

/// Long-term advert snapshots, possibly several per address.
pub struct SnapshotImporter;

impl SnapshotImporter {
    const SOURCE: &'static str = "snapshots";

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Imported<PropertySnapshot>, IngestError> {
        Self::from_reader(open(path.as_ref(), Self::SOURCE)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Imported<PropertySnapshot>, IngestError> {
        import::<R, SnapshotRow>(reader, Self::SOURCE)
    }
}
