//! Static Chart Renderer
//! Writes the report's charts as PNG files with plotters, plus `report.json`.
//!
//! Files:
//! 1. `device_share.png`: pie of device shares in the busiest window
//! 2. `clicks_per_hour.png`: total clicks per hour line chart
//! 3. `device_by_product.png`: device split per product, stacked to 100%
//! 4. `report.json`: every question's answer or error

use crate::analysis::{ClickSeries, DeviceBreakdown, DeviceMix, Report};
use crate::charts::{device_rgb, fractions, pie_slices, ACCENT_RGB};
use plotters::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 700;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Drawing failed: {0}")]
    Draw(String),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

fn rgb(c: (u8, u8, u8)) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every answered chart into `dir`. Questions without an answer
    /// are skipped; `report.json` is always written.
    pub fn export(dir: &Path, report: &Report) -> Result<Vec<PathBuf>, RenderError> {
        fs::create_dir_all(dir)?;

        // Written before any chart so a drawing failure still leaves it
        let json_path = dir.join("report.json");
        fs::write(&json_path, serde_json::to_string_pretty(&report.to_json())?)?;
        let mut written = vec![json_path];

        match &report.device_share {
            Ok(Some(breakdown)) => {
                let path = dir.join("device_share.png");
                Self::render_device_pie(&path, breakdown)?;
                written.push(path);
            }
            Ok(None) => warn!("No busiest window, skipping device share chart"),
            Err(e) => warn!(error = %e, "Skipping device share chart"),
        }

        match &report.click_series {
            Ok(series) => {
                let path = dir.join("clicks_per_hour.png");
                Self::render_click_series(&path, series)?;
                written.push(path);
            }
            Err(e) => warn!(error = %e, "Skipping click series chart"),
        }

        match &report.device_mix {
            Ok(mix) => {
                let path = dir.join("device_by_product.png");
                Self::render_device_mix(&path, mix)?;
                written.push(path);
            }
            Err(e) => warn!(error = %e, "Skipping device mix chart"),
        }

        info!(files = written.len(), dir = %dir.display(), "Exported report");
        Ok(written)
    }

    pub fn render_device_pie(path: &Path, breakdown: &DeviceBreakdown) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        root.draw(&Text::new(
            "Click Distribution by Device",
            (WIDTH as i32 / 2 - 190, 24),
            ("sans-serif", 30).into_font(),
        ))
        .map_err(draw_err)?;

        let values: Vec<f64> = breakdown.shares.iter().map(|s| s.clicks as f64).collect();
        let fracs = fractions(&values);

        let (cx, cy) = (WIDTH as f64 / 2.0 - 120.0, HEIGHT as f64 / 2.0 + 30.0);
        let radius = 260.0;
        let to_px = |(x, y): (f64, f64), r: f64| ((cx + x * r) as i32, (cy - y * r) as i32);

        let slices = breakdown.shares.iter().zip(&fracs).zip(pie_slices(&fracs));
        for ((share, &fraction), slice) in slices {
            if fraction <= 0.0 {
                continue;
            }
            let fill = rgb(device_rgb(&share.device)).filled();
            for [a, b, c] in slice.triangles() {
                root.draw(&Polygon::new(
                    vec![to_px(a, radius), to_px(b, radius), to_px(c, radius)],
                    fill,
                ))
                .map_err(draw_err)?;
            }
            let (lx, ly) = to_px(slice.mid, radius * 0.65);
            root.draw(&Text::new(
                format!("{:.1}%", fraction * 100.0),
                (lx - 24, ly - 10),
                ("sans-serif", 22).into_font().color(&WHITE),
            ))
            .map_err(draw_err)?;
        }

        // Legend
        let legend_x = (cx + radius + 80.0) as i32;
        for (i, share) in breakdown.shares.iter().enumerate() {
            let y = 200 + i as i32 * 36;
            root.draw(&Rectangle::new(
                [(legend_x, y), (legend_x + 22, y + 22)],
                rgb(device_rgb(&share.device)).filled(),
            ))
            .map_err(draw_err)?;
            root.draw(&Text::new(
                share.device.clone(),
                (legend_x + 32, y + 2),
                ("sans-serif", 20).into_font(),
            ))
            .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
        Ok(())
    }

    pub fn render_click_series(path: &Path, series: &ClickSeries) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let labels: Vec<String> = series
            .points
            .iter()
            .map(|p| p.timestamp.format("%m-%d %H:%M").to_string())
            .collect();
        let top = series.max_clicks() + series.max_clicks() / 10 + 1;

        let mut chart = ChartBuilder::on(&root)
            .caption("Total Clicks per Hour", ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(0usize..series.len().max(1), 0i64..top)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Date and Time")
            .y_desc("Number of Clicks")
            .x_labels(12)
            .x_label_formatter(&|i: &usize| labels.get(*i).cloned().unwrap_or_default())
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(LineSeries::new(
                series.points.iter().enumerate().map(|(i, p)| (i, p.clicks)),
                rgb(ACCENT_RGB).stroke_width(2),
            ))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }

    pub fn render_device_mix(path: &Path, mix: &DeviceMix) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let products = mix.products();
        let devices = mix.devices();

        let mut chart = ChartBuilder::on(&root)
            .caption("Click Device Distribution by Product", ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((0..products.len()).into_segmented(), 0f64..100f64)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Product")
            .y_desc("Clicks (%)")
            .x_label_formatter(&|v: &SegmentValue<usize>| match v {
                SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                    products.get(*i).cloned().unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            })
            .draw()
            .map_err(draw_err)?;

        let mut labelled: HashSet<&str> = HashSet::new();
        for (i, product) in products.iter().enumerate() {
            let mut base = 0.0;
            for device in &devices {
                let percent = mix
                    .get(product, device)
                    .and_then(|r| r.percent)
                    .unwrap_or(0.0);
                if percent <= 0.0 {
                    continue;
                }

                let fill = rgb(device_rgb(device));
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(i), base),
                        (SegmentValue::Exact(i + 1), base + percent),
                    ],
                    fill.filled(),
                );
                bar.set_margin(0, 0, 20, 20);

                let anno = chart
                    .draw_series(std::iter::once(bar))
                    .map_err(draw_err)?;
                if labelled.insert(device.as_str()) {
                    anno.label(device.clone()).legend(move |(x, y)| {
                        Rectangle::new([(x, y - 6), (x + 12, y + 6)], fill.filled())
                    });
                }
                base += percent;
            }
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }
}
