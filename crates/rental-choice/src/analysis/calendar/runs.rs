use super::domain::BookingStatus;
use chrono::NaiveDate;

/// Lengths of the contiguous blocked periods in a date-sorted, deduplicated calendar.
///
/// A run continues only while each blocked day is exactly one calendar day after the
/// previous blocked day. A missing day in the ledger or any non-blocked status ends it.
pub(crate) fn blocked_runs(days: &[(NaiveDate, BookingStatus)]) -> Vec<u32> {
    let mut runs = Vec::new();
    let mut current: Option<(NaiveDate, u32)> = None;

    for &(date, status) in days {
        if status != BookingStatus::Blocked {
            if let Some((_, len)) = current.take() {
                runs.push(len);
            }
            continue;
        }

        current = match current {
            Some((last, len)) if last.succ_opt() == Some(date) => Some((date, len + 1)),
            Some((_, len)) => {
                runs.push(len);
                Some((date, 1))
            }
            None => Some((date, 1)),
        };
    }

    if let Some((_, len)) = current {
        runs.push(len);
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::{Available, Blocked, Booked};

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 3, 1).expect("valid date") + chrono::Duration::days(offset)
    }

    #[test]
    fn status_change_ends_run() {
        let days = vec![
            (day(0), Blocked),
            (day(1), Blocked),
            (day(2), Booked),
            (day(3), Blocked),
            (day(4), Available),
        ];
        assert_eq!(blocked_runs(&days), vec![2, 1]);
    }

    #[test]
    fn calendar_gap_ends_run_even_when_rows_are_adjacent() {
        let days = vec![(day(0), Blocked), (day(1), Blocked), (day(5), Blocked)];
        assert_eq!(blocked_runs(&days), vec![2, 1]);
    }

    #[test]
    fn trailing_run_is_counted() {
        let days = vec![(day(0), Booked), (day(1), Blocked), (day(2), Blocked), (day(3), Blocked)];
        assert_eq!(blocked_runs(&days), vec![3]);
    }

    #[test]
    fn month_boundary_is_contiguous() {
        let days = vec![(day(-1), Blocked), (day(0), Blocked)];
        assert_eq!(blocked_runs(&days), vec![2]);
    }

    #[test]
    fn no_blocked_days_yields_no_runs() {
        assert!(blocked_runs(&[(day(0), Booked), (day(1), Available)]).is_empty());
        assert!(blocked_runs(&[]).is_empty());
    }
}
