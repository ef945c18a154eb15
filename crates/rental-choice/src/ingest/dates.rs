use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Alternate layouts tried once ISO parsing fails, in order.
const REPAIR_FORMATS: [&str; 3] = ["%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ParsedDate {
    pub date: NaiveDate,
    /// Needed a non-ISO layout.
    pub repaired: bool,
}

pub(crate) fn parse_date(value: &str) -> Option<ParsedDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(ParsedDate {
            date,
            repaired: false,
        });
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ParsedDate {
            date: dt.naive_utc().date(),
            repaired: false,
        });
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(ParsedDate {
            date: dt.date(),
            repaired: true,
        });
    }

    REPAIR_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| compact(trimmed))
        .map(|date| ParsedDate {
            date,
            repaired: true,
        })
}

/// `YYYYMMDD` with no separators.
fn compact(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = value[0..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
