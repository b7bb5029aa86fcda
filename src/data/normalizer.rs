//! Data Normalizer Module
//! Parses raw text sources into typed records and unifies them into one table.

use crate::data::loader::RawSource;
use crate::data::table::{ClickRecord, ClickTable};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use thiserror::Error;
use tracing::info;

/// Layouts accepted for directly parseable calendar dates.
const CALENDAR_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y"];
const CALENDAR_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("{source_name} row {row}: invalid {column} '{value}': {reason}")]
    InvalidValue {
        source_name: String,
        row: usize,
        column: &'static str,
        value: String,
        reason: String,
    },
}

/// Calendar dates must spell the year with four digits, so a packed
/// `20/06/02` is rejected instead of read as the year 20.
fn has_four_digit_year(value: &str) -> bool {
    let date_part = value.split([' ', 'T']).next().unwrap_or_default();
    let fields: Vec<&str> = date_part.split(['-', '/']).collect();
    fields.len() == 3
        && fields
            .iter()
            .any(|f| f.len() == 4 && f.bytes().all(|b| b.is_ascii_digit()))
}

/// How a source encodes its `date` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// Two-digit year, month and day: `20/06/02` is 2020-06-02.
    /// Years `00`-`68` land in 2000-2068 and `69`-`99` in 1969-1999.
    PackedYearFirst,
    /// A calendar date in one of the common layouts.
    Calendar,
}

impl DateLayout {
    pub fn parse(self, value: &str) -> Result<NaiveDate, String> {
        match self {
            DateLayout::PackedYearFirst => {
                let bytes = value.as_bytes();
                if bytes.len() != 8 || bytes[2] != b'/' || bytes[5] != b'/' {
                    return Err("expected the YY/MM/DD layout".to_string());
                }
                NaiveDate::parse_from_str(value, "%y/%m/%d").map_err(|e| e.to_string())
            }
            DateLayout::Calendar => {
                if !has_four_digit_year(value) {
                    return Err("expected a four digit year".to_string());
                }
                let date = CALENDAR_DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok());
                let date = date.or_else(|| {
                    CALENDAR_DATETIME_FORMATS
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                        .map(|dt| dt.date())
                });
                date.ok_or_else(|| "not a recognised calendar date".to_string())
            }
        }
    }
}

/// Hour labels such as `01:00:00`; unpadded hours are accepted.
pub fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|e| e.to_string())
}

/// Non-negative whole click count; integral floats like `12.0` pass.
pub fn parse_clicks(value: &str) -> Result<i64, String> {
    if let Ok(n) = value.parse::<i64>() {
        return if n >= 0 {
            Ok(n)
        } else {
            Err("click count is negative".to_string())
        };
    }

    match value.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < i64::MAX as f64 => {
            Ok(f as i64)
        }
        Ok(_) => Err("not a non-negative whole number".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Non-negative, finite revenue amount.
pub fn parse_revenue(value: &str) -> Result<f64, String> {
    let amount = value.parse::<f64>().map_err(|e| e.to_string())?;
    if !amount.is_finite() || amount < 0.0 {
        return Err("revenue must be a finite non-negative amount".to_string());
    }
    Ok(amount)
}

/// Position of a cell, for error reports.
struct Cell<'a> {
    source_name: &'a str,
    row: usize,
}

impl Cell<'_> {
    fn parse<T>(
        &self,
        column: &'static str,
        cell: &Option<String>,
        parse: impl FnOnce(&str) -> Result<T, String>,
    ) -> Result<T, NormalizeError> {
        let raw = cell.as_deref().unwrap_or_default();
        let value = raw.trim();
        if value.is_empty() {
            return Err(self.invalid(column, raw, "empty value".to_string()));
        }
        parse(value).map_err(|reason| self.invalid(column, raw, reason))
    }

    fn invalid(&self, column: &'static str, value: &str, reason: String) -> NormalizeError {
        NormalizeError::InvalidValue {
            source_name: self.source_name.to_string(),
            row: self.row,
            column,
            value: value.to_string(),
            reason,
        }
    }
}

/// Handles date canonicalization and merging of the two sources.
pub struct Normalizer;

impl Normalizer {
    /// Parse every row of a raw source. The first parse failure aborts.
    pub fn normalize_source(
        raw: &RawSource,
        layout: DateLayout,
    ) -> Result<Vec<ClickRecord>, NormalizeError> {
        let dates = raw.text_column("date")?;
        let times = raw.text_column("time")?;
        let products = raw.text_column("product")?;
        let devices = raw.text_column("device")?;
        let clicks = raw.text_column("clicks")?;
        let revenue = raw.text_column("clicks_rev")?;

        let mut records = Vec::with_capacity(raw.height());
        for i in 0..raw.height() {
            // Row numbers count data rows from 1, header excluded
            let cell = Cell {
                source_name: &raw.name,
                row: i + 1,
            };

            records.push(ClickRecord {
                date: cell.parse("date", &dates[i], |v| layout.parse(v))?,
                time: cell.parse("time", &times[i], parse_time)?,
                product: cell.parse("product", &products[i], |v| Ok(v.to_string()))?,
                device: cell.parse("device", &devices[i], |v| Ok(v.to_string()))?,
                clicks: cell.parse("clicks", &clicks[i], parse_clicks)?,
                clicks_rev: cell.parse("clicks_rev", &revenue[i], parse_revenue)?,
            });
        }

        Ok(records)
    }

    /// Normalize both sources and concatenate them, packed-date source first.
    pub fn unify(packed: &RawSource, calendar: &RawSource) -> Result<ClickTable, NormalizeError> {
        let mut records = Self::normalize_source(packed, DateLayout::PackedYearFirst)?;
        let calendar_records = Self::normalize_source(calendar, DateLayout::Calendar)?;

        info!(
            packed_rows = records.len(),
            calendar_rows = calendar_records.len(),
            "Normalized click sources"
        );

        records.extend(calendar_records);
        Ok(ClickTable::from_records(&records)?)
    }
}
