//! Busiest three-hour window and the device split inside it.

use super::{ensure_not_empty, hourly_buckets, int_values, percent, text_values, QuestionResult};
use crate::data::table::{CLICKS, DATE, DATE_FORMAT, DEVICE, TIME, TIME_FORMAT};
use crate::data::ClickTable;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Devices that always get a share, even with no clicks in the window.
pub const KNOWN_DEVICES: [&str; 3] = ["mobile", "computer", "tablet"];

/// Number of hourly buckets in a window.
const WINDOW_LEN: usize = 3;

/// One (date, time) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Slot {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Clicks summed over one hourly bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub slot: Slot,
    pub clicks: i64,
}

/// The three consecutive buckets with the most clicks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusiestWindow {
    pub start: Slot,
    pub middle: Slot,
    pub end: Slot,
    pub total_clicks: i64,
}

impl BusiestWindow {
    pub fn slots(&self) -> [Slot; WINDOW_LEN] {
        [self.start, self.middle, self.end]
    }

    /// `"22 - 0"` style hour range.
    pub fn hour_range(&self) -> String {
        format!("{} - {}", self.start.time.hour(), self.end.time.hour())
    }

    pub fn crosses_midnight(&self) -> bool {
        self.start.date != self.end.date
    }
}

/// Pick the first bucket whose forward three-bucket sum is the largest.
///
/// `buckets` must be in chronological order. Fewer than three buckets
/// leave no window.
pub fn find_busiest(buckets: &[Bucket]) -> Option<BusiestWindow> {
    let mut best: Option<(usize, i64)> = None;

    for (i, window) in buckets.windows(WINDOW_LEN).enumerate() {
        let total: i64 = window.iter().map(|b| b.clicks).sum();
        // Strictly greater keeps the earliest of tied windows
        if best.map_or(true, |(_, top)| total > top) {
            best = Some((i, total));
        }
    }

    best.map(|(i, total_clicks)| BusiestWindow {
        start: buckets[i].slot,
        middle: buckets[i + 1].slot,
        end: buckets[i + 2].slot,
        total_clicks,
    })
}

/// Q1: the three-hour window with the most clicks.
pub fn busiest_window(table: &ClickTable) -> QuestionResult<Option<BusiestWindow>> {
    ensure_not_empty(table)?;
    let buckets = hourly_buckets(table)?;
    Ok(find_busiest(&buckets))
}

/// Clicks and share for a single device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceShare {
    pub device: String,
    pub clicks: i64,
    /// Percent of the window total; undefined when the window had no clicks.
    pub percent: Option<f64>,
}

/// Device split of the clicks in the busiest window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceBreakdown {
    pub total_clicks: i64,
    /// Largest share first.
    pub shares: Vec<DeviceShare>,
}

impl DeviceBreakdown {
    pub fn from_counts(counts: impl IntoIterator<Item = (String, i64)>) -> Self {
        let counts: Vec<(String, i64)> = counts.into_iter().collect();
        let total_clicks = counts.iter().map(|(_, c)| c).sum();

        let mut shares: Vec<DeviceShare> = counts
            .into_iter()
            .map(|(device, clicks)| DeviceShare {
                percent: percent(clicks, total_clicks),
                device,
                clicks,
            })
            .collect();
        // Share is proportional to clicks, so this orders by percent
        shares.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.device.cmp(&b.device)));

        Self {
            total_clicks,
            shares,
        }
    }

    pub fn share(&self, device: &str) -> Option<f64> {
        self.shares
            .iter()
            .find(|s| s.device == device)
            .and_then(|s| s.percent)
    }
}

/// Q2: device shares of the clicks inside `window`.
///
/// Rows are matched on the exact (date, time) of each window bucket, so a
/// window running past midnight picks up the next day's rows.
pub fn device_share(table: &ClickTable, window: &BusiestWindow) -> QuestionResult<DeviceBreakdown> {
    ensure_not_empty(table)?;

    let in_window = window.slots().iter().fold(lit(false), |acc, slot| {
        let date = slot.date.format(DATE_FORMAT).to_string();
        let time = slot.time.format(TIME_FORMAT).to_string();
        acc.or(col(DATE).eq(lit(date)).and(col(TIME).eq(lit(time))))
    });

    let df = table
        .frame()
        .clone()
        .lazy()
        .filter(in_window)
        .group_by([col(DEVICE)])
        .agg([col(CLICKS).sum()])
        .collect()?;

    let mut counts: BTreeMap<String, i64> = table
        .devices()?
        .into_iter()
        .chain(KNOWN_DEVICES.iter().map(|d| d.to_string()))
        .map(|device| (device, 0))
        .collect();

    for (device, clicks) in text_values(&df, DEVICE)?.into_iter().zip(int_values(&df, CLICKS)?) {
        *counts.entry(device).or_insert(0) += clicks;
    }

    Ok(DeviceBreakdown::from_counts(counts))
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{record, table};
    use super::*;

    fn buckets(clicks: &[i64]) -> Vec<Bucket> {
        let date = NaiveDate::from_ymd_opt(2020, 6, 2).unwrap();
        clicks
            .iter()
            .enumerate()
            .map(|(hour, &clicks)| Bucket {
                slot: Slot {
                    date,
                    time: NaiveTime::from_hms_opt(hour as u32, 0, 0).unwrap(),
                },
                clicks,
            })
            .collect()
    }

    fn hour(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_find_busiest_known_answer() {
        let window = find_busiest(&buckets(&[10, 20, 5, 40, 30])).unwrap();
        // 5 + 40 + 30 = 75 beats 20 + 5 + 40 = 65
        assert_eq!(window.total_clicks, 75);
        assert_eq!(window.start.time, hour(2));
        assert_eq!(window.end.time, hour(4));

        // Without the 04:00 bucket the 01:00 window wins
        let window = find_busiest(&buckets(&[10, 20, 5, 40])).unwrap();
        assert_eq!(window.total_clicks, 65);
        assert_eq!(window.start.time, hour(1));
        assert_eq!(window.end.time, hour(3));
    }

    #[test]
    fn test_find_busiest_matches_brute_force() {
        let clicks = [3, 9, 1, 7, 7, 2, 8, 0, 4];
        let window = find_busiest(&buckets(&clicks)).unwrap();
        let best = (0..clicks.len() - 2)
            .map(|i| clicks[i] + clicks[i + 1] + clicks[i + 2])
            .max()
            .unwrap();
        assert_eq!(window.total_clicks, best);
    }

    #[test]
    fn test_find_busiest_ties_keep_first() {
        let window = find_busiest(&buckets(&[5, 5, 5, 5, 5])).unwrap();
        assert_eq!(window.start.time, hour(0));
        assert_eq!(window.hour_range(), "0 - 2");
    }

    #[test]
    fn test_too_few_buckets() {
        assert_eq!(find_busiest(&buckets(&[1, 2])), None);
        assert_eq!(find_busiest(&[]), None);
    }

    #[test]
    fn test_busiest_window_sorts_and_sums_buckets() {
        // Rows out of order and split across devices and products
        let t = table(&[
            record((2020, 6, 2), 3, "auto", "mobile", 40, 0.0),
            record((2020, 6, 2), 0, "auto", "mobile", 10, 0.0),
            record((2020, 6, 2), 4, "home", "tablet", 30, 0.0),
            record((2020, 6, 2), 1, "auto", "computer", 15, 0.0),
            record((2020, 6, 2), 1, "home", "mobile", 5, 0.0),
            record((2020, 6, 2), 2, "auto", "mobile", 5, 0.0),
        ]);

        let window = busiest_window(&t).unwrap().unwrap();
        assert_eq!(window.total_clicks, 75);
        assert_eq!(window.start.time, hour(2));
        assert_eq!(window.middle.time, hour(3));
        assert_eq!(window.end.time, hour(4));
        assert!(!window.crosses_midnight());
    }

    #[test]
    fn test_window_across_midnight() {
        let t = table(&[
            record((2020, 6, 2), 21, "auto", "mobile", 1, 0.0),
            record((2020, 6, 2), 22, "auto", "mobile", 50, 0.0),
            record((2020, 6, 2), 23, "auto", "tablet", 50, 0.0),
            record((2020, 6, 3), 0, "auto", "computer", 50, 0.0),
            record((2020, 6, 3), 1, "auto", "mobile", 1, 0.0),
            // Same hour on the start date must not leak into the window
            record((2020, 6, 2), 0, "auto", "tablet", 2, 0.0),
        ]);

        let window = busiest_window(&t).unwrap().unwrap();
        assert_eq!(window.total_clicks, 150);
        assert!(window.crosses_midnight());
        assert_eq!(window.end.date, NaiveDate::from_ymd_opt(2020, 6, 3).unwrap());
        assert_eq!(window.hour_range(), "22 - 0");

        let breakdown = device_share(&t, &window).unwrap();
        assert_eq!(breakdown.total_clicks, 150);
        assert_eq!(breakdown.share("computer").map(f64::round), Some(33.0));
        assert_eq!(breakdown.share("tablet").map(f64::round), Some(33.0));
    }

    #[test]
    fn test_device_share_sums_to_hundred() {
        let t = table(&[
            record((2020, 6, 2), 0, "auto", "mobile", 30, 0.0),
            record((2020, 6, 2), 1, "auto", "computer", 10, 0.0),
            record((2020, 6, 2), 2, "home", "mobile", 20, 0.0),
            record((2020, 6, 2), 9, "home", "tablet", 1, 0.0),
        ]);
        let window = busiest_window(&t).unwrap().unwrap();
        let breakdown = device_share(&t, &window).unwrap();

        let total: f64 = breakdown.shares.iter().filter_map(|s| s.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert!(breakdown
            .shares
            .iter()
            .filter_map(|s| s.percent)
            .all(|p| (0.0..=100.0).contains(&p)));

        // Largest share first; devices absent from the window read 0%
        assert_eq!(breakdown.shares[0].device, "mobile");
        assert_eq!(breakdown.share("mobile"), Some(50.0 / 60.0 * 100.0));
        assert_eq!(breakdown.share("tablet"), Some(0.0));
    }

    #[test]
    fn test_device_share_of_silent_window() {
        let breakdown = DeviceBreakdown::from_counts(vec![
            ("mobile".to_string(), 0),
            ("tablet".to_string(), 0),
        ]);
        assert_eq!(breakdown.total_clicks, 0);
        assert_eq!(breakdown.share("mobile"), None);
    }
}
