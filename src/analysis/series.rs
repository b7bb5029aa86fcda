//! Hourly click series and the device mix of each product.

use super::window::{Bucket, Slot};
use super::{date_values, ensure_not_empty, int_values, percent, text_values, time_values, QuestionResult};
use crate::data::table::{CLICKS, DATE, DEVICE, PRODUCT, TIME};
use crate::data::ClickTable;
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Clicks per (date, time) bucket in chronological order.
///
/// Sorting here is what makes neighbouring buckets neighbouring hours for
/// the rolling window; the merged table carries no order guarantee.
pub fn hourly_buckets(table: &ClickTable) -> QuestionResult<Vec<Bucket>> {
    let df = table
        .frame()
        .clone()
        .lazy()
        .group_by([col(DATE), col(TIME)])
        .agg([col(CLICKS).sum()])
        .sort([DATE, TIME], SortMultipleOptions::default())
        .collect()?;

    let dates = date_values(&df, DATE)?;
    let times = time_values(&df, TIME)?;
    let clicks = int_values(&df, CLICKS)?;

    Ok(dates
        .into_iter()
        .zip(times)
        .zip(clicks)
        .map(|((date, time), clicks)| Bucket {
            slot: Slot { date, time },
            clicks,
        })
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    pub clicks: i64,
}

/// Total clicks per timestamp, oldest first. Missing hours are not filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickSeries {
    pub points: Vec<SeriesPoint>,
}

impl ClickSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn total_clicks(&self) -> i64 {
        self.points.iter().map(|p| p.clicks).sum()
    }

    pub fn max_clicks(&self) -> i64 {
        self.points.iter().map(|p| p.clicks).max().unwrap_or(0)
    }

    /// Points with `start <= timestamp <= end`.
    pub fn between(&self, start: NaiveDateTime, end: NaiveDateTime) -> ClickSeries {
        ClickSeries {
            points: self
                .points
                .iter()
                .filter(|p| p.timestamp >= start && p.timestamp <= end)
                .copied()
                .collect(),
        }
    }
}

/// Q3a: the click time series.
pub fn click_series(table: &ClickTable) -> QuestionResult<ClickSeries> {
    ensure_not_empty(table)?;
    let points = hourly_buckets(table)?
        .into_iter()
        .map(|b| SeriesPoint {
            timestamp: b.slot.timestamp(),
            clicks: b.clicks,
        })
        .collect();
    Ok(ClickSeries { points })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDeviceShare {
    pub product: String,
    pub device: String,
    pub clicks: i64,
    /// Percent of the product's clicks, not of all clicks.
    pub percent: Option<f64>,
}

/// Per-product device shares, fewest clicks first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceMix {
    pub rows: Vec<ProductDeviceShare>,
}

impl DeviceMix {
    /// Products in order of first appearance.
    pub fn products(&self) -> Vec<String> {
        first_seen(self.rows.iter().map(|r| r.product.as_str()))
    }

    /// Devices in order of first appearance.
    pub fn devices(&self) -> Vec<String> {
        first_seen(self.rows.iter().map(|r| r.device.as_str()))
    }

    pub fn get(&self, product: &str, device: &str) -> Option<&ProductDeviceShare> {
        self.rows
            .iter()
            .find(|r| r.product == product && r.device == device)
    }
}

fn first_seen<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !seen.iter().any(|s| s == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

/// Q3b: each device's share of clicks within its product.
pub fn device_mix(table: &ClickTable) -> QuestionResult<DeviceMix> {
    ensure_not_empty(table)?;

    let df = table
        .frame()
        .clone()
        .lazy()
        .group_by([col(PRODUCT), col(DEVICE)])
        .agg([col(CLICKS).sum()])
        .sort([PRODUCT, DEVICE], SortMultipleOptions::default())
        .collect()?;

    let products = text_values(&df, PRODUCT)?;
    let devices = text_values(&df, DEVICE)?;
    let clicks = int_values(&df, CLICKS)?;

    let mut product_totals: HashMap<&str, i64> = HashMap::new();
    for (product, &c) in products.iter().zip(&clicks) {
        *product_totals.entry(product.as_str()).or_insert(0) += c;
    }

    let mut rows: Vec<ProductDeviceShare> = products
        .iter()
        .zip(devices)
        .zip(&clicks)
        .map(|((product, device), &c)| ProductDeviceShare {
            percent: percent(c, product_totals.get(product.as_str()).copied().unwrap_or(0)),
            product: product.clone(),
            device,
            clicks: c,
        })
        .collect();
    // Stable: equal counts keep product, device order
    rows.sort_by_key(|r| r.clicks);

    Ok(DeviceMix { rows })
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{record, table};
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn sample() -> ClickTable {
        table(&[
            record((2020, 6, 2), 1, "auto", "mobile", 6, 3.0),
            record((2020, 6, 2), 0, "auto", "computer", 2, 1.0),
            record((2020, 6, 2), 1, "home", "mobile", 4, 1.0),
            record((2020, 6, 3), 5, "home", "tablet", 4, 2.0),
            record((2020, 6, 2), 0, "home", "computer", 0, 0.0),
        ])
    }

    #[test]
    fn test_series_is_chronological() {
        let series = click_series(&sample()).unwrap();
        let stamps: Vec<NaiveDateTime> = series.points.iter().map(|p| p.timestamp).collect();
        let mut sorted = stamps.clone();
        sorted.sort();
        assert_eq!(stamps, sorted);
    }

    #[test]
    fn test_series_covers_each_bucket_once() {
        let t = sample();
        let series = click_series(&t).unwrap();
        // (06-02 00), (06-02 01), (06-03 05)
        assert_eq!(series.len(), 3);
        assert_eq!(series.total_clicks(), t.total_clicks().unwrap());
        assert_eq!(series.points[1].clicks, 10);
        assert_eq!(series.max_clicks(), 10);
    }

    #[test]
    fn test_series_between() {
        let series = click_series(&sample()).unwrap();
        let day = NaiveDate::from_ymd_opt(2020, 6, 2).unwrap();
        let start = day.and_time(NaiveTime::from_hms_opt(1, 0, 0).unwrap());
        let end = day.and_time(NaiveTime::from_hms_opt(23, 0, 0).unwrap());

        let filtered = series.between(start, end);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.points[0].timestamp, start);
    }

    #[test]
    fn test_device_mix_normalized_per_product() {
        let mix = device_mix(&sample()).unwrap();

        for product in mix.products() {
            let total: f64 = mix
                .rows
                .iter()
                .filter(|r| r.product == product)
                .filter_map(|r| r.percent)
                .sum();
            assert!((total - 100.0).abs() < 1e-9, "{} sums to {}", product, total);
        }

        assert_eq!(mix.get("auto", "mobile").unwrap().percent, Some(75.0));
        assert_eq!(mix.get("home", "tablet").unwrap().percent, Some(50.0));
        assert_eq!(mix.get("home", "computer").unwrap().percent, Some(0.0));
    }

    #[test]
    fn test_device_mix_ordered_by_clicks() {
        let mix = device_mix(&sample()).unwrap();
        let clicks: Vec<i64> = mix.rows.iter().map(|r| r.clicks).collect();
        assert_eq!(clicks, vec![0, 2, 4, 4, 6]);
        // Ties keep product then device order
        assert_eq!(mix.rows[2].device, "mobile");
        assert_eq!(mix.rows[3].device, "tablet");
        assert_eq!(mix.products(), vec!["home", "auto"]);
    }

    #[test]
    fn test_product_without_clicks_has_no_shares() {
        let mix = device_mix(&table(&[record((2020, 6, 2), 0, "pets", "mobile", 0, 0.0)])).unwrap();
        assert_eq!(mix.rows[0].percent, None);
    }
}
