//! Control Panel Widget
//! Left side panel with the loaded sources, export button and status line.

use egui::{Color32, RichText};
use std::path::PathBuf;

/// Row count of one loaded source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSummary {
    pub name: String,
    pub rows: usize,
}

/// Left side control panel.
pub struct ControlPanel {
    pub sources: Vec<SourceSummary>,
    pub unified_rows: usize,
    pub export_dir: PathBuf,
    pub status: String,
    pub exporting: bool,
}

impl ControlPanel {
    pub fn new(sources: Vec<SourceSummary>, unified_rows: usize, export_dir: PathBuf) -> Self {
        Self {
            sources,
            unified_rows,
            export_dir,
            status: "Ready".to_string(),
            exporting: false,
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // ===== Data Sources =====
        ui.label(RichText::new("📁 Data Sources").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("sources_grid")
                    .num_columns(2)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        for source in &self.sources {
                            ui.label(RichText::new(&source.name).size(12.0));
                            ui.label(format!("{} rows", source.rows));
                            ui.end_row();
                        }
                        ui.label(RichText::new("Unified").size(12.0).strong());
                        ui.label(format!("{} rows", self.unified_rows));
                        ui.end_row();
                    });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export =====
        ui.label(RichText::new("📄 Export").size(14.0).strong());
        ui.add_space(5.0);
        ui.label(
            RichText::new(self.export_dir.display().to_string())
                .size(11.0)
                .color(Color32::GRAY),
        );
        ui.add_space(5.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(!self.exporting, |ui| {
                let button = egui::Button::new(RichText::new("Export Charts").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Export;
                }
            });
        });

        ui.add_space(10.0);
        if self.exporting {
            ui.add(egui::Spinner::new());
        }

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Export,
}
