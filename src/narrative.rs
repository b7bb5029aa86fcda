//! Report text: question titles, result sentences and the Markdown report.

use crate::analysis::{AnalysisError, BusiestWindow, DeviceBreakdown, PeakRpc, Report};
use crate::data::table::TIME_FORMAT;

pub const Q1_TITLE: &str =
    "Question 1: Which 3 hour window across the entire date range shows the largest amount of clicks?";
pub const Q2_TITLE: &str =
    "Question 2: For the 3 hour window you found in question 1, what percent of the clicks in these 3 hours were \u{201c}mobile\u{201d}?";
pub const Q3_TITLE: &str = "Question 3: Graph the time series of clicks on datetime";
pub const Q4_TITLE: &str =
    "Question 4: For each product, find the hour (time) that shows the highest RPC";

/// Shown wherever a value is undefined.
pub const NOT_AVAILABLE: &str = "N/A";

/// Page title block.
#[derive(Debug, Clone)]
pub struct PageHeader {
    pub title: String,
    pub subtitle: String,
}

impl Default for PageHeader {
    fn default() -> Self {
        Self {
            title: "Click Analysis".to_string(),
            subtitle: "Ad click events report".to_string(),
        }
    }
}

/// Q1 sentence, with `**` marking the emphasised parts.
pub fn window_sentence(window: &BusiestWindow) -> String {
    let start = window.start.time.format(TIME_FORMAT);
    let end = window.end.time.format(TIME_FORMAT);
    let span = if window.crosses_midnight() {
        format!(
            "between {} {} and {} {}",
            window.start.date, start, window.end.date, end
        )
    } else {
        format!("{} between {} and {}", window.start.date, start, end)
    };

    format!(
        "The 3 hour window with the largest amount of clicks happens on **{}**, with a total of **{} clicks!**",
        span, window.total_clicks
    )
}

/// Split text on `**` markers into (run, emphasised) pairs.
pub fn emphasis_runs(text: &str) -> Vec<(&str, bool)> {
    text.split("**")
        .enumerate()
        .filter(|(_, run)| !run.is_empty())
        .map(|(i, run)| (run, i % 2 == 1))
        .collect()
}

/// Whole-percent label, `N/A` when undefined. Halves round to even.
pub fn percent_label(percent: Option<f64>) -> String {
    percent
        .map(|p| format!("{}%", p.round_ties_even()))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Metric tile value for one device.
pub fn share_label(breakdown: Option<&DeviceBreakdown>, device: &str) -> String {
    percent_label(breakdown.and_then(|b| b.share(device)))
}

pub fn rpc_label(rpc: Option<f64>) -> String {
    rpc.map(|r| format!("{:.4}", r))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Table rows for Q4: product, time, clicks, clicks_rev, rpc.
pub fn peak_rpc_rows(peaks: &[PeakRpc]) -> Vec<[String; 5]> {
    peaks
        .iter()
        .map(|p| {
            [
                p.product.clone(),
                p.time.format(TIME_FORMAT).to_string(),
                p.clicks.to_string(),
                format!("{:.2}", p.clicks_rev),
                rpc_label(p.rpc),
            ]
        })
        .collect()
}

pub fn failure_line(error: &AnalysisError) -> String {
    format!("Could not be answered: {}", error)
}

/// Render the whole report as Markdown.
pub fn markdown(report: &Report, header: &PageHeader) -> String {
    let mut md = String::new();
    md.push_str(&format!("# {}\n\n", header.title));
    md.push_str(&format!("_{}_\n\n---\n\n", header.subtitle));

    md.push_str(&format!("## {}\n\n", Q1_TITLE));
    match &report.busiest_window {
        Ok(Some(window)) => md.push_str(&format!("* {}\n\n", window_sentence(window))),
        Ok(None) => md.push_str("* Fewer than three hourly buckets: no window.\n\n"),
        Err(e) => md.push_str(&format!("* {}\n\n", failure_line(e))),
    }
    md.push_str("---\n\n");

    md.push_str(&format!("## {}\n\n", Q2_TITLE));
    match &report.device_share {
        Ok(Some(breakdown)) => {
            md.push_str("| Device | Clicks | Share |\n");
            md.push_str("|--------|--------|-------|\n");
            for share in &breakdown.shares {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    share.device,
                    share.clicks,
                    percent_label(share.percent)
                ));
            }
            md.push('\n');
        }
        Ok(None) => md.push_str(&format!("* {}\n\n", NOT_AVAILABLE)),
        Err(e) => md.push_str(&format!("* {}\n\n", failure_line(e))),
    }
    md.push_str("---\n\n");

    md.push_str(&format!("## {}\n\n", Q3_TITLE));
    match &report.click_series {
        Ok(series) => {
            if let (Some(first), Some(last)) = (series.points.first(), series.points.last()) {
                md.push_str(&format!(
                    "* {} hourly points from {} to {}, {} clicks in total, peak hour {} clicks.\n\n",
                    series.len(),
                    first.timestamp,
                    last.timestamp,
                    series.total_clicks(),
                    series.max_clicks()
                ));
            }
        }
        Err(e) => md.push_str(&format!("* {}\n\n", failure_line(e))),
    }
    match &report.device_mix {
        Ok(mix) => {
            md.push_str("| Product | Device | Clicks | Share of product |\n");
            md.push_str("|---------|--------|--------|------------------|\n");
            for row in &mix.rows {
                let share = row
                    .percent
                    .map(|p| format!("{:.2}%", p))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    row.product, row.device, row.clicks, share
                ));
            }
            md.push('\n');
        }
        Err(e) => md.push_str(&format!("* {}\n\n", failure_line(e))),
    }
    md.push_str("---\n\n");

    md.push_str(&format!("## {}\n\n", Q4_TITLE));
    match &report.peak_rpc {
        Ok(peaks) => {
            md.push_str("| Product | Time | Clicks | Clicks Rev | RPC |\n");
            md.push_str("|---------|------|--------|------------|-----|\n");
            for row in peak_rpc_rows(peaks) {
                md.push_str(&format!("| {} |\n", row.join(" | ")));
            }
            md.push('\n');
        }
        Err(e) => md.push_str(&format!("* {}\n\n", failure_line(e))),
    }

    md
}
