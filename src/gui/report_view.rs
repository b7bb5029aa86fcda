//! Report View Widget
//! The four question sections of the dashboard, top to bottom.

use crate::analysis::{AnalysisError, ClickSeries, DeviceBreakdown, Report};
use crate::charts::ChartPlotter;
use crate::narrative::{self, Q1_TITLE, Q2_TITLE, Q3_TITLE, Q4_TITLE};
use egui::{Color32, RichText};
use std::collections::BTreeSet;

const SECTION_SPACING: f32 = 15.0;

/// Metric tiles under the pie, in display order.
const TILES: [(&str, &str); 3] = [
    ("Mobile", "mobile"),
    ("Computer", "computer"),
    ("Tablet", "tablet"),
];

/// Keep an inclusive index range inside a series of `len` points.
pub fn clamp_range(range: (usize, usize), len: usize) -> (usize, usize) {
    if len == 0 {
        return (0, 0);
    }
    let end = range.1.min(len - 1);
    (range.0.min(end), end)
}

/// Dashboard state that survives between frames.
pub struct ReportView {
    hidden_devices: BTreeSet<String>,
    /// Inclusive point range shown in the click series chart
    range: (usize, usize),
}

impl ReportView {
    pub fn new(report: &Report) -> Self {
        let len = report.click_series.as_ref().map(ClickSeries::len).unwrap_or(0);
        Self {
            hidden_devices: BTreeSet::new(),
            range: (0, len.saturating_sub(1)),
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, report: &Report) {
        Self::section_title(ui, Q1_TITLE);
        match &report.busiest_window {
            Ok(Some(window)) => Self::emphasised(ui, &narrative::window_sentence(window)),
            Ok(None) => {
                ui.label("Fewer than three hourly buckets, so there is no 3 hour window.");
            }
            Err(e) => Self::error_label(ui, e),
        }
        Self::section_break(ui);

        Self::section_title(ui, Q2_TITLE);
        let breakdown = match &report.device_share {
            Ok(breakdown) => breakdown.as_ref(),
            Err(e) => {
                Self::error_label(ui, e);
                None
            }
        };
        if let Some(breakdown) = breakdown {
            ChartPlotter::draw_device_pie(ui, breakdown, &mut self.hidden_devices);
        }
        Self::metric_tiles(ui, breakdown);
        Self::section_break(ui);

        Self::section_title(ui, Q3_TITLE);
        match &report.click_series {
            Ok(series) => self.click_series(ui, series),
            Err(e) => Self::error_label(ui, e),
        }
        ui.add_space(SECTION_SPACING);
        match &report.device_mix {
            Ok(mix) => ChartPlotter::draw_device_mix(ui, mix),
            Err(e) => Self::error_label(ui, e),
        }
        Self::section_break(ui);

        Self::section_title(ui, Q4_TITLE);
        match &report.peak_rpc {
            Ok(peaks) => ChartPlotter::draw_peak_rpc_table(ui, peaks),
            Err(e) => Self::error_label(ui, e),
        }
        ui.add_space(SECTION_SPACING);
    }

    /// Line chart with a start/end selector over the series.
    fn click_series(&mut self, ui: &mut egui::Ui, series: &ClickSeries) {
        if series.is_empty() {
            ui.label(narrative::NOT_AVAILABLE);
            return;
        }

        let last = series.len() - 1;
        let (mut start, mut end) = clamp_range(self.range, series.len());
        let stamp = |i: f64| {
            series
                .points
                .get(i as usize)
                .map(|p| p.timestamp.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default()
        };

        ui.horizontal(|ui| {
            ui.label("From");
            ui.add(egui::Slider::new(&mut start, 0..=last).custom_formatter(|v, _| stamp(v)));
            ui.label("to");
            ui.add(egui::Slider::new(&mut end, 0..=last).custom_formatter(|v, _| stamp(v)));
            if ui.small_button("Reset").clicked() {
                start = 0;
                end = last;
            }
        });
        // Dragging start past end moves end along
        self.range = clamp_range((start, end.max(start)), series.len());

        let shown = series.between(
            series.points[self.range.0].timestamp,
            series.points[self.range.1].timestamp,
        );
        ChartPlotter::draw_click_series(ui, &shown);
    }

    fn metric_tiles(ui: &mut egui::Ui, breakdown: Option<&DeviceBreakdown>) {
        ui.add_space(8.0);
        ui.columns(TILES.len(), |columns| {
            for (ui, (label, device)) in columns.iter_mut().zip(TILES) {
                egui::Frame::none()
                    .fill(ui.visuals().widgets.noninteractive.bg_fill)
                    .rounding(8.0)
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.vertical_centered(|ui| {
                            ui.label(RichText::new(label).size(14.0).color(Color32::GRAY));
                            ui.label(
                                RichText::new(narrative::share_label(breakdown, device))
                                    .size(28.0)
                                    .strong(),
                            );
                        });
                    });
            }
        });
    }

    fn section_title(ui: &mut egui::Ui, title: &str) {
        ui.label(RichText::new(title).size(18.0).strong());
        ui.add_space(8.0);
    }

    fn section_break(ui: &mut egui::Ui) {
        ui.add_space(SECTION_SPACING);
        ui.separator();
        ui.add_space(SECTION_SPACING);
    }

    /// Text with `**` runs drawn strong.
    fn emphasised(ui: &mut egui::Ui, text: &str) {
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            for (run, strong) in narrative::emphasis_runs(text) {
                let rich = RichText::new(run).size(15.0);
                ui.label(if strong { rich.strong() } else { rich });
            }
        });
    }

    fn error_label(ui: &mut egui::Ui, error: &AnalysisError) {
        ui.colored_label(
            Color32::from_rgb(220, 53, 69),
            narrative::failure_line(error),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_range() {
        assert_eq!(clamp_range((0, 10), 4), (0, 3));
        assert_eq!(clamp_range((5, 10), 4), (3, 3));
        assert_eq!(clamp_range((1, 2), 4), (1, 2));
        assert_eq!(clamp_range((3, 7), 0), (0, 0));
    }
}
