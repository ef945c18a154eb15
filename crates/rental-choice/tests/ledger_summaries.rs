use chrono::NaiveDate;
use rental_choice::analysis::calendar::{self, BookingStatus, ObservationWindow};
use rental_choice::ingest::{DropReason, LedgerImporter};
use std::io::Cursor;

fn window() -> ObservationWindow {
    ObservationWindow::new(NaiveDate::from_ymd_opt(2016, 1, 1).expect("valid date"), 366)
}

#[test]
fn duplicate_days_keep_the_first_ledger_row() {
    let csv = "property_id,date,status,price,booking_date\n\
               L1,2016-03-01,R,150,\n\
               L1,2016-03-01,B,,\n\
               L1,2016-03-02,A,,\n";
    let imported = LedgerImporter::from_reader(Cursor::new(csv)).expect("import");
    let summaries = calendar::summarize(imported.records, &window(), 4);

    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.total_days, 2);
    assert_eq!(summary.bookings, 1);
    assert_eq!(summary.block_rate, 0.0);
    assert_eq!(summary.med_rate, Some(150.0));
}

#[test]
fn blocked_runs_break_on_calendar_gaps() {
    // blocked on 1st, 2nd and 4th: the missing 3rd splits the run
    let csv = "property_id,date,status,price,booking_date\n\
               L1,2016-05-01,B,,\n\
               L1,2016-05-02,B,,\n\
               L1,2016-05-04,B,,\n\
               L1,2016-05-05,R,90,\n";
    let imported = LedgerImporter::from_reader(Cursor::new(csv)).expect("import");
    let summary = calendar::summarize(imported.records, &window(), 1)
        .pop()
        .expect("summary");

    assert_eq!(summary.nbr_block, 2);
    assert_eq!(summary.med_block_len, Some(1.5));
    assert!((summary.block_rate + summary.avail_rate + summary.occ_rate - 1.0).abs() < 1e-9);
}

#[test]
fn rows_without_identifier_or_status_are_dropped_not_fatal() {
    let csv = "property_id,date,status,price,booking_date\n\
               ,2016-01-01,R,100,\n\
               L2,2016-01-01,maybe,,\n\
               L2,2016-01-02,available,,\n";
    let imported = LedgerImporter::from_reader(Cursor::new(csv)).expect("import");

    assert_eq!(imported.report.dropped_for(DropReason::MissingIdentifier), 1);
    assert_eq!(imported.report.dropped_for(DropReason::UnknownStatus), 1);
    assert_eq!(imported.records.len(), 1);
    assert_eq!(imported.records[0].status, BookingStatus::Available);
}

#[test]
fn listings_with_only_out_of_window_rows_have_no_summary() {
    let csv = "property_id,date,status,price,booking_date\n\
               L1,2015-06-01,R,100,\n\
               L2,2016-06-01,R,100,\n";
    let imported = LedgerImporter::from_reader(Cursor::new(csv)).expect("import");
    let summaries = calendar::summarize(imported.records, &window(), 2);

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].property_id, "L2");
}
