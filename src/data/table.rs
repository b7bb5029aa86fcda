//! Unified Click Table
//! Typed click records and the Polars frame every analysis reads from.

use chrono::{NaiveDate, NaiveTime};
use polars::prelude::*;
use serde::Serialize;

pub const DATE: &str = "date";
pub const TIME: &str = "time";
pub const PRODUCT: &str = "product";
pub const DEVICE: &str = "device";
pub const CLICKS: &str = "clicks";
pub const CLICKS_REV: &str = "clicks_rev";
pub const RPC: &str = "rpc";

/// Canonical text layouts stored in the frame. Both sort chronologically.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Revenue per click, undefined when there were no clicks.
pub fn rpc(clicks_rev: f64, clicks: i64) -> Option<f64> {
    (clicks > 0).then(|| clicks_rev / clicks as f64)
}

/// One row of the unified table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickRecord {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub product: String,
    pub device: String,
    pub clicks: i64,
    pub clicks_rev: f64,
}

impl ClickRecord {
    pub fn rpc(&self) -> Option<f64> {
        rpc(self.clicks_rev, self.clicks)
    }
}

/// Immutable click table shared by all four analyses.
///
/// Columns: [date, time, product, device, clicks, clicks_rev, rpc], with
/// `date` and `time` held in their canonical text layouts and `rpc` null
/// wherever `clicks` is zero.
#[derive(Debug, Clone)]
pub struct ClickTable {
    df: DataFrame,
}

impl ClickTable {
    /// Build the frame column by column from typed records.
    pub fn from_records(records: &[ClickRecord]) -> PolarsResult<Self> {
        let dates: Vec<String> = records
            .iter()
            .map(|r| r.date.format(DATE_FORMAT).to_string())
            .collect();
        let times: Vec<String> = records
            .iter()
            .map(|r| r.time.format(TIME_FORMAT).to_string())
            .collect();
        let products: Vec<String> = records.iter().map(|r| r.product.clone()).collect();
        let devices: Vec<String> = records.iter().map(|r| r.device.clone()).collect();
        let clicks: Vec<i64> = records.iter().map(|r| r.clicks).collect();
        let revenue: Vec<f64> = records.iter().map(|r| r.clicks_rev).collect();
        let rpcs: Vec<Option<f64>> = records.iter().map(ClickRecord::rpc).collect();

        let df = DataFrame::new(vec![
            Column::new(DATE.into(), dates),
            Column::new(TIME.into(), times),
            Column::new(PRODUCT.into(), products),
            Column::new(DEVICE.into(), devices),
            Column::new(CLICKS.into(), clicks),
            Column::new(CLICKS_REV.into(), revenue),
            Column::new(RPC.into(), rpcs),
        ])?;

        Ok(Self { df })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Sum of clicks over every row.
    pub fn total_clicks(&self) -> PolarsResult<i64> {
        Ok(self.df.column(CLICKS)?.i64()?.sum().unwrap_or(0))
    }

    /// Distinct device labels, sorted.
    pub fn devices(&self) -> PolarsResult<Vec<String>> {
        let mut devices: Vec<String> = self
            .df
            .column(DEVICE)?
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        devices.sort();
        devices.dedup();
        Ok(devices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(clicks: i64, clicks_rev: f64) -> ClickRecord {
        ClickRecord {
            date: NaiveDate::from_ymd_opt(2020, 6, 2).unwrap(),
            time: NaiveTime::from_hms_opt(5, 0, 0).unwrap(),
            product: "auto".to_string(),
            device: "mobile".to_string(),
            clicks,
            clicks_rev,
        }
    }

    #[test]
    fn test_zero_clicks_has_no_rpc() {
        assert_eq!(record(0, 0.0).rpc(), None);
        assert_eq!(record(4, 10.0).rpc(), Some(2.5));
    }

    #[test]
    fn test_frame_layout() {
        let table = ClickTable::from_records(&[record(4, 10.0), record(0, 0.0)]).unwrap();
        let df = table.frame();

        assert_eq!(table.height(), 2);
        assert_eq!(df.column(DATE).unwrap().str().unwrap().get(0), Some("2020-06-02"));
        assert_eq!(df.column(TIME).unwrap().str().unwrap().get(0), Some("05:00:00"));

        let rpc = df.column(RPC).unwrap().f64().unwrap();
        assert_eq!(rpc.get(0), Some(2.5));
        assert_eq!(rpc.get(1), None);
        assert_eq!(table.total_clicks().unwrap(), 4);
    }

    #[test]
    fn test_devices_are_distinct() {
        let mut tablet = record(1, 1.0);
        tablet.device = "tablet".to_string();
        let table = ClickTable::from_records(&[record(1, 1.0), tablet, record(2, 2.0)]).unwrap();
        assert_eq!(table.devices().unwrap(), vec!["mobile", "tablet"]);
    }

    #[test]
    fn test_empty_table() {
        let table = ClickTable::from_records(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.total_clicks().unwrap(), 0);
    }
}
