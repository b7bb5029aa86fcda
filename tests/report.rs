//! End to end: CSV sources on disk through to the report answers.

use chrono::{NaiveDate, NaiveTime};
use click_report::analysis::{AnalysisError, Report};
use click_report::data::{DataLoader, LoaderError, NormalizeError, Normalizer};
use click_report::narrative::{self, PageHeader};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &str = "date,time,product,device,clicks,clicks_rev";

fn write_csv(dir: &TempDir, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    let mut body = String::from(HEADER);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    fs::write(&path, body).unwrap();
    path
}

fn build(hlm: &[&str], pc: &[&str]) -> Result<Report, NormalizeError> {
    let dir = TempDir::new().unwrap();
    let packed = DataLoader::load_csv(write_csv(&dir, "hlm.csv", hlm)).unwrap();
    let calendar = DataLoader::load_csv(write_csv(&dir, "pc.csv", pc)).unwrap();
    let table = Normalizer::unify(&packed, &calendar)?;
    Ok(Report::build(&table))
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 6, d).unwrap()
}

#[test]
fn test_busiest_window_across_both_sources() {
    // Bucket totals [10, 20, 5, 40, 30] split over the two sources
    let report = build(
        &[
            "20/06/02,00:00:00,auto,mobile,10,5.0",
            "20/06/02,01:00:00,auto,mobile,12,6.0",
            "20/06/02,03:00:00,home,tablet,40,8.0",
        ],
        &[
            "2020-06-02,01:00:00,home,computer,8,4.0",
            "2020-06-02,02:00:00,auto,mobile,5,1.0",
            "2020-06-02,04:00:00,auto,computer,30,3.0",
        ],
    )
    .unwrap();

    let window = report.busiest_window.unwrap().unwrap();
    assert_eq!(window.total_clicks, 75);
    assert_eq!((window.start.date, window.start.time), (day(2), hour(2)));
    assert_eq!((window.end.date, window.end.time), (day(2), hour(4)));

    // 5 mobile, 40 tablet, 30 computer
    let breakdown = report.device_share.unwrap().unwrap();
    assert_eq!(breakdown.total_clicks, 75);
    let total: f64 = breakdown.shares.iter().filter_map(|s| s.percent).sum();
    assert!((total - 100.0).abs() < 1e-9);
    assert!(breakdown
        .shares
        .iter()
        .all(|s| (0.0..=100.0).contains(&s.percent.unwrap())));
    assert_eq!(narrative::share_label(Some(&breakdown), "mobile"), "7%");
    assert_eq!(narrative::share_label(Some(&breakdown), "tablet"), "53%");
    assert_eq!(narrative::share_label(Some(&breakdown), "computer"), "40%");
}

#[test]
fn test_window_crossing_midnight_keeps_next_day_rows() {
    let report = build(
        &[
            "20/06/02,21:00:00,auto,tablet,1,1.0",
            "20/06/02,22:00:00,auto,mobile,50,1.0",
            "20/06/02,23:00:00,auto,mobile,50,1.0",
        ],
        &[
            "2020-06-03,00:00:00,auto,computer,50,1.0",
            "2020-06-03,01:00:00,auto,tablet,1,1.0",
            // Same time label on the start date, outside the window
            "2020-06-02,00:00:00,auto,tablet,2,1.0",
        ],
    )
    .unwrap();

    let window = report.busiest_window.unwrap().unwrap();
    assert_eq!(window.total_clicks, 150);
    assert!(window.crosses_midnight());
    assert_eq!(window.hour_range(), "22 - 0");

    let breakdown = report.device_share.unwrap().unwrap();
    assert_eq!(breakdown.total_clicks, 150);
    assert_eq!(breakdown.share("computer").map(f64::round), Some(33.0));
    assert_eq!(breakdown.share("tablet"), Some(0.0));
}

#[test]
fn test_series_and_device_mix() {
    let report = build(
        &[
            "20/06/02,00:00:00,auto,mobile,3,1.0",
            "20/06/02,00:00:00,auto,tablet,1,1.0",
            "20/06/02,05:00:00,home,mobile,6,1.0",
        ],
        &["2020-06-02,05:00:00,home,computer,2,1.0"],
    )
    .unwrap();

    // Distinct (date, time) pairs, no gap filling
    let series = report.click_series.unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.total_clicks(), 12);
    assert_eq!(series.points[1].clicks, 8);

    let mix = report.device_mix.unwrap();
    for product in mix.products() {
        let total: f64 = mix
            .rows
            .iter()
            .filter(|r| r.product == product)
            .filter_map(|r| r.percent)
            .sum();
        assert!((total - 100.0).abs() < 1e-9, "{}", product);
    }
    assert_eq!(mix.get("auto", "mobile").unwrap().percent, Some(75.0));
}

#[test]
fn test_peak_rpc_uses_ratio_of_sums_and_tolerates_zero_clicks() {
    let report = build(
        &[
            "20/06/02,01:00:00,auto,mobile,1,10.0",
            "20/06/02,02:00:00,auto,mobile,5,10.0",
            "20/06/02,01:00:00,pets,mobile,0,0",
        ],
        &["2020-06-03,01:00:00,auto,tablet,9,9.0"],
    )
    .unwrap();

    let peaks = report.peak_rpc.unwrap();
    assert_eq!(peaks.len(), 2);
    assert_eq!(peaks[0].product, "auto");
    assert_eq!(peaks[0].time, hour(2));
    assert_eq!(peaks[0].rpc, Some(2.0));
    assert_eq!(peaks[1].product, "pets");
    assert_eq!(peaks[1].rpc, None);
}

#[test]
fn test_too_few_buckets_answers_other_questions() {
    let report = build(&["20/06/02,01:00:00,auto,mobile,1,1.0"], &[]).unwrap();

    assert_eq!(report.busiest_window, Ok(None));
    assert_eq!(report.device_share, Ok(None));
    assert!(report.click_series.is_ok());
    assert!(report.peak_rpc.is_ok());
}

#[test]
fn test_empty_sources_fail_each_question() {
    let report = build(&[], &[]).unwrap();
    assert_eq!(report.click_series, Err(AnalysisError::EmptyTable));
    assert_eq!(report.peak_rpc, Err(AnalysisError::EmptyTable));
}

#[test]
fn test_malformed_packed_date_is_fatal() {
    let error = build(&["2020-06-02,01:00:00,auto,mobile,1,1.0"], &[]).unwrap_err();
    match error {
        NormalizeError::InvalidValue {
            source_name,
            row,
            column,
            ..
        } => {
            assert_eq!(source_name, "hlm.csv");
            assert_eq!(row, 1);
            assert_eq!(column, "date");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_source_and_column() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        DataLoader::load_csv(dir.path().join("absent.csv")),
        Err(LoaderError::Missing(_))
    ));

    let path = dir.path().join("short.csv");
    fs::write(&path, "date,time,product,device,clicks\n20/06/02,01:00:00,a,b,1\n").unwrap();
    assert!(matches!(
        DataLoader::load_csv(&path),
        Err(LoaderError::MissingColumn { column: "clicks_rev", .. })
    ));
}

#[test]
fn test_markdown_report() {
    let report = build(
        &[
            "20/06/02,00:00:00,auto,mobile,10,5.0",
            "20/06/02,01:00:00,auto,mobile,20,5.0",
        ],
        &["2020-06-02,02:00:00,auto,tablet,5,5.0"],
    )
    .unwrap();

    let md = narrative::markdown(&report, &PageHeader::default());
    assert!(md.contains(
        "happens on **2020-06-02 between 00:00:00 and 02:00:00**, with a total of **35 clicks!**"
    ));
    assert!(md.contains("| mobile | 30 | 86% |"));
    assert!(md.contains("| auto | 02:00:00 | 5 | 5.00 | 1.0000 |"));
}
