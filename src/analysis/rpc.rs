//! Peak revenue-per-click hour of each product.

use super::{ensure_not_empty, float_values, int_values, text_values, time_values, QuestionResult};
use crate::data::table::{rpc, CLICKS, CLICKS_REV, PRODUCT, TIME};
use crate::data::ClickTable;
use chrono::NaiveTime;
use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

/// The hour with the highest aggregated RPC for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakRpc {
    pub product: String,
    pub time: NaiveTime,
    pub clicks: i64,
    pub clicks_rev: f64,
    /// Ratio of summed revenue to summed clicks; undefined without clicks.
    pub rpc: Option<f64>,
}

fn beats(candidate: Option<f64>, current: Option<f64>) -> bool {
    match (candidate, current) {
        (Some(c), Some(cur)) => c > cur,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Highest RPC first, undefined last.
fn by_rpc_desc(a: &PeakRpc, b: &PeakRpc) -> Ordering {
    match (a.rpc, b.rpc) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Q4: per product, the time of day with the highest RPC across all dates.
///
/// RPC is recomputed from the summed clicks and revenue of each
/// (product, time) group rather than averaged over rows.
pub fn peak_rpc_hours(table: &ClickTable) -> QuestionResult<Vec<PeakRpc>> {
    ensure_not_empty(table)?;

    let df = table
        .frame()
        .clone()
        .lazy()
        .group_by([col(PRODUCT), col(TIME)])
        .agg([col(CLICKS).sum(), col(CLICKS_REV).sum()])
        .sort([PRODUCT, TIME], SortMultipleOptions::default())
        .collect()?;

    let products = text_values(&df, PRODUCT)?;
    let times = time_values(&df, TIME)?;
    let clicks = int_values(&df, CLICKS)?;
    let revenue = float_values(&df, CLICKS_REV)?;

    let mut peaks: Vec<PeakRpc> = Vec::new();
    let rows = products.into_iter().zip(times).zip(clicks).zip(revenue);
    for (((product, time), clicks), clicks_rev) in rows {
        let candidate = PeakRpc {
            rpc: rpc(clicks_rev, clicks),
            product,
            time,
            clicks,
            clicks_rev,
        };

        match peaks.last_mut() {
            Some(peak) if peak.product == candidate.product => {
                // Ties keep the earlier hour
                if beats(candidate.rpc, peak.rpc) {
                    *peak = candidate;
                }
            }
            _ => peaks.push(candidate),
        }
    }

    peaks.sort_by(by_rpc_desc);
    Ok(peaks)
}
