//! Chart Plotter Module
//! Draws the dashboard charts with egui and egui_plot.

use crate::analysis::{ClickSeries, DeviceBreakdown, DeviceMix, PeakRpc};
use crate::charts::{device_rgb, fractions, pie_slices, ACCENT_RGB};
use crate::narrative;
use egui::{Align2, Color32, FontId, RichText, Sense, Shape, Stroke};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};
use std::collections::BTreeSet;

const CHART_HEIGHT: f32 = 320.0;
const PIE_HEIGHT: f32 = 280.0;

fn color(rgb: (u8, u8, u8)) -> Color32 {
    Color32::from_rgb(rgb.0, rgb.1, rgb.2)
}

/// Category axis labels: only whole positions get a name.
fn category_label(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if idx < 0.0 || (value - idx).abs() > 1e-6 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Creates the dashboard's charts.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Pie of device shares. Ticking a device off in the legend hides its
    /// slice and the rest are rescaled.
    pub fn draw_device_pie(ui: &mut egui::Ui, breakdown: &DeviceBreakdown, hidden: &mut BTreeSet<String>) {
        ui.vertical_centered(|ui| {
            ui.label(RichText::new("Click Distribution by Device").size(16.0).strong());
        });

        // Legend with visibility toggles
        ui.horizontal(|ui| {
            for share in &breakdown.shares {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), Sense::hover());
                ui.painter().rect_filled(rect, 3.0, color(device_rgb(&share.device)));

                let mut visible = !hidden.contains(&share.device);
                if ui.checkbox(&mut visible, share.device.as_str()).changed() {
                    if visible {
                        hidden.remove(&share.device);
                    } else {
                        hidden.insert(share.device.clone());
                    }
                }
                ui.add_space(12.0);
            }
        });

        let shown: Vec<_> = breakdown
            .shares
            .iter()
            .filter(|s| !hidden.contains(&s.device))
            .collect();
        let values: Vec<f64> = shown.iter().map(|s| s.clicks as f64).collect();
        let fracs = fractions(&values);

        let (response, painter) =
            ui.allocate_painter(egui::vec2(ui.available_width(), PIE_HEIGHT), Sense::hover());
        let center = response.rect.center();
        let radius = PIE_HEIGHT * 0.45;
        let to_screen = |(x, y): (f64, f64), r: f32| center + egui::vec2(x as f32 * r, -(y as f32) * r);

        if fracs.iter().all(|f| *f <= 0.0) {
            painter.text(
                center,
                Align2::CENTER_CENTER,
                narrative::NOT_AVAILABLE,
                FontId::proportional(18.0),
                ui.visuals().text_color(),
            );
            return;
        }

        for ((share, &fraction), slice) in shown.iter().zip(&fracs).zip(pie_slices(&fracs)) {
            if fraction <= 0.0 {
                continue;
            }
            let fill = color(device_rgb(&share.device));
            for [a, b, c] in slice.triangles() {
                painter.add(Shape::convex_polygon(
                    vec![to_screen(a, radius), to_screen(b, radius), to_screen(c, radius)],
                    fill,
                    Stroke::NONE,
                ));
            }
            painter.text(
                to_screen(slice.mid, radius * 0.65),
                Align2::CENTER_CENTER,
                format!("{:.1}%", fraction * 100.0),
                FontId::proportional(13.0),
                Color32::WHITE,
            );
        }
    }

    /// Line of total clicks per hour; the x axis is categorical like the
    /// series itself, so missing hours do not leave gaps.
    pub fn draw_click_series(ui: &mut egui::Ui, series: &ClickSeries) {
        let labels: Vec<String> = series
            .points
            .iter()
            .map(|p| p.timestamp.format("%Y-%m-%d %H:%M").to_string())
            .collect();
        let points: PlotPoints = series
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| [i as f64, p.clicks as f64])
            .collect();

        ui.vertical_centered(|ui| {
            ui.label(RichText::new("Total Clicks per Hour").size(16.0).strong());
        });

        Plot::new("click_series")
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Date and Time")
            .y_axis_label("Number of Clicks")
            .include_y(0.0)
            .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(points)
                        .color(color(ACCENT_RGB))
                        .width(2.0)
                        .name("Clicks"),
                );
            });
    }

    /// Stacked bars of each product's device split, normalized to 100%.
    pub fn draw_device_mix(ui: &mut egui::Ui, mix: &DeviceMix) {
        let products = mix.products();

        let mut charts: Vec<BarChart> = Vec::new();
        for device in mix.devices() {
            let bars: Vec<Bar> = products
                .iter()
                .enumerate()
                .map(|(i, product)| {
                    let percent = mix
                        .get(product, &device)
                        .and_then(|r| r.percent)
                        .unwrap_or(0.0);
                    Bar::new(i as f64, percent)
                        .width(0.6)
                        .name(format!("{} {}: {:.2}%", product, device, percent))
                })
                .collect();

            let below: Vec<&BarChart> = charts.iter().collect();
            let chart = BarChart::new(bars)
                .name(&device)
                .color(color(device_rgb(&device)))
                .stack_on(&below);
            charts.push(chart);
        }

        ui.vertical_centered(|ui| {
            ui.label(RichText::new("Click Device Distribution by Product").size(16.0).strong());
        });

        Plot::new("device_mix")
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Product")
            .y_axis_label("Clicks (%)")
            .include_y(0.0)
            .include_y(100.0)
            .x_axis_formatter(move |mark, _range| category_label(&products, mark.value))
            .show(ui, |plot_ui| {
                for chart in charts {
                    plot_ui.bar_chart(chart);
                }
            });
    }

    /// Peak RPC hour table.
    pub fn draw_peak_rpc_table(ui: &mut egui::Ui, peaks: &[PeakRpc]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("peak_rpc_table")
                    .striped(true)
                    .min_col_width(90.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["product", "time", "clicks", "clicks_rev", "rpc"] {
                            ui.label(RichText::new(header).strong());
                        }
                        ui.end_row();

                        for row in narrative::peak_rpc_rows(peaks) {
                            for cell in row {
                                ui.label(cell);
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}
