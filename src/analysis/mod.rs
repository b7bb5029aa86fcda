//! Analysis module - the four click report questions
//!
//! Each question is a stateless function over an immutable [`ClickTable`].
//! [`Report::build`] runs them on the rayon pool and keeps every answer,
//! or its error, independently so one failure never hides the others.

mod rpc;
mod series;
mod window;

pub use rpc::{peak_rpc_hours, PeakRpc};
pub use series::{click_series, device_mix, hourly_buckets, ClickSeries, DeviceMix, ProductDeviceShare, SeriesPoint};
pub use window::{busiest_window, device_share, find_busiest, Bucket, BusiestWindow, DeviceBreakdown, DeviceShare, Slot, KNOWN_DEVICES};

use crate::data::table::{DATE_FORMAT, TIME_FORMAT};
use crate::data::ClickTable;
use chrono::{NaiveDate, NaiveTime};
use polars::prelude::*;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("No click data to analyze")]
    EmptyTable,
    #[error("Polars error: {0}")]
    PolarsError(String),
    #[error("Unexpected null in column '{0}'")]
    NullValue(String),
    #[error("Unreadable {column} value '{value}'")]
    BadValue { column: String, value: String },
}

impl From<PolarsError> for AnalysisError {
    fn from(e: PolarsError) -> Self {
        AnalysisError::PolarsError(e.to_string())
    }
}

pub type QuestionResult<T> = Result<T, AnalysisError>;

/// Every question fails fast on an empty table.
fn ensure_not_empty(table: &ClickTable) -> QuestionResult<()> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyTable);
    }
    Ok(())
}

fn text_values(df: &DataFrame, column: &str) -> QuestionResult<Vec<String>> {
    df.column(column)?
        .str()?
        .into_iter()
        .map(|v| {
            v.map(str::to_string)
                .ok_or_else(|| AnalysisError::NullValue(column.to_string()))
        })
        .collect()
}

fn int_values(df: &DataFrame, column: &str) -> QuestionResult<Vec<i64>> {
    df.column(column)?
        .i64()?
        .into_iter()
        .map(|v| v.ok_or_else(|| AnalysisError::NullValue(column.to_string())))
        .collect()
}

fn float_values(df: &DataFrame, column: &str) -> QuestionResult<Vec<f64>> {
    df.column(column)?
        .f64()?
        .into_iter()
        .map(|v| v.ok_or_else(|| AnalysisError::NullValue(column.to_string())))
        .collect()
}

fn date_values(df: &DataFrame, column: &str) -> QuestionResult<Vec<NaiveDate>> {
    text_values(df, column)?
        .into_iter()
        .map(|v| {
            NaiveDate::parse_from_str(&v, DATE_FORMAT).map_err(|_| AnalysisError::BadValue {
                column: column.to_string(),
                value: v,
            })
        })
        .collect()
}

fn time_values(df: &DataFrame, column: &str) -> QuestionResult<Vec<NaiveTime>> {
    text_values(df, column)?
        .into_iter()
        .map(|v| {
            NaiveTime::parse_from_str(&v, TIME_FORMAT).map_err(|_| AnalysisError::BadValue {
                column: column.to_string(),
                value: v,
            })
        })
        .collect()
}

/// Percentage of `part` in `whole`; undefined for an empty whole.
pub fn percent(part: i64, whole: i64) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

/// Answers to all four questions.
#[derive(Debug, Clone)]
pub struct Report {
    pub busiest_window: QuestionResult<Option<BusiestWindow>>,
    pub device_share: QuestionResult<Option<DeviceBreakdown>>,
    pub click_series: QuestionResult<ClickSeries>,
    pub device_mix: QuestionResult<DeviceMix>,
    pub peak_rpc: QuestionResult<Vec<PeakRpc>>,
}

impl Report {
    /// Run the four questions. Q2 needs Q1's window, so the two share a
    /// branch; Q3 and Q4 run alongside.
    pub fn build(table: &ClickTable) -> Self {
        let ((busiest, share), (series, (mix, peak))) = rayon::join(
            || {
                let busiest = busiest_window(table);
                let share = match &busiest {
                    Ok(Some(win)) => device_share(table, win).map(Some),
                    Ok(None) => Ok(None),
                    Err(e) => Err(e.clone()),
                };
                (busiest, share)
            },
            || {
                rayon::join(
                    || click_series(table),
                    || rayon::join(|| device_mix(table), || peak_rpc_hours(table)),
                )
            },
        );

        let report = Self {
            busiest_window: busiest,
            device_share: share,
            click_series: series,
            device_mix: mix,
            peak_rpc: peak,
        };
        report.log_failures();
        report
    }

    fn log_failures(&self) {
        let failures = [
            ("busiest_window", self.busiest_window.as_ref().err()),
            ("device_share", self.device_share.as_ref().err()),
            ("click_series", self.click_series.as_ref().err()),
            ("device_mix", self.device_mix.as_ref().err()),
            ("peak_rpc", self.peak_rpc.as_ref().err()),
        ];
        let mut failed = 0;
        for (question, error) in failures {
            if let Some(error) = error {
                warn!(question, %error, "Question could not be answered");
                failed += 1;
            }
        }
        debug!(failed, "Report built");
    }

    /// Per-question `{"ok": ...}` or `{"error": ...}` entries.
    pub fn to_json(&self) -> Value {
        fn entry<T: Serialize>(result: &QuestionResult<T>) -> Value {
            match result {
                Ok(answer) => json!({ "ok": answer }),
                Err(e) => json!({ "error": e.to_string() }),
            }
        }

        json!({
            "busiest_window": entry(&self.busiest_window),
            "device_share": entry(&self.device_share),
            "click_series": entry(&self.click_series),
            "device_mix": entry(&self.device_mix),
            "peak_rpc": entry(&self.peak_rpc),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::data::{ClickRecord, ClickTable};
    use chrono::{NaiveDate, NaiveTime};

    pub fn record(
        date: (i32, u32, u32),
        hour: u32,
        product: &str,
        device: &str,
        clicks: i64,
        clicks_rev: f64,
    ) -> ClickRecord {
        ClickRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            product: product.to_string(),
            device: device.to_string(),
            clicks,
            clicks_rev,
        }
    }

    pub fn table(records: &[ClickRecord]) -> ClickTable {
        ClickTable::from_records(records).unwrap()
    }
}
