//! Click Report Main Application
//! Main window with control panel and the report view.

use crate::analysis::Report;
use crate::charts::StaticChartRenderer;
use crate::gui::{ControlPanel, ControlPanelAction, ReportView};
use crate::narrative::PageHeader;
use egui::{RichText, SidePanel, TextureHandle};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use tracing::{info, warn};

/// Export result from background thread
enum ExportResult {
    Complete(Vec<PathBuf>),
    Error(String),
}

/// Decode the logo into a texture; a missing or broken logo only warns.
fn load_logo(ctx: &egui::Context, path: &Path) -> Option<TextureHandle> {
    match image::open(path) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let color = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
            Some(ctx.load_texture("logo", color, egui::TextureOptions::LINEAR))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Logo not loaded");
            None
        }
    }
}

/// Main application window.
pub struct ReportApp {
    report: Report,
    header: PageHeader,
    logo: Option<TextureHandle>,
    control_panel: ControlPanel,
    report_view: ReportView,

    // Async export
    export_rx: Option<Receiver<ExportResult>>,
}

impl ReportApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        report: Report,
        header: PageHeader,
        logo_path: &Path,
        control_panel: ControlPanel,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        Self {
            logo: load_logo(&cc.egui_ctx, logo_path),
            report_view: ReportView::new(&report),
            report,
            header,
            control_panel,
            export_rx: None,
        }
    }

    /// Render the static charts in a background thread.
    fn start_export(&mut self) {
        if self.control_panel.exporting {
            return;
        }

        let (tx, rx) = channel();
        self.export_rx = Some(rx);
        self.control_panel.exporting = true;
        self.control_panel.set_status("Exporting charts...");

        let dir = self.control_panel.export_dir.clone();
        let report = self.report.clone();
        thread::spawn(move || {
            let result = match StaticChartRenderer::export(&dir, &report) {
                Ok(files) => ExportResult::Complete(files),
                Err(e) => ExportResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for export results
    fn check_export_results(&mut self) {
        let Some(rx) = self.export_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(ExportResult::Complete(files)) => {
                info!(files = files.len(), "Dashboard export finished");
                self.control_panel
                    .set_status(&format!("Exported {} files", files.len()));
                self.control_panel.exporting = false;
            }
            Ok(ExportResult::Error(error)) => {
                warn!(%error, "Dashboard export failed");
                self.control_panel.set_status(&format!("Error: {}", error));
                self.control_panel.exporting = false;
            }
            // Put receiver back while the thread is still working
            Err(TryRecvError::Empty) => self.export_rx = Some(rx),
            Err(TryRecvError::Disconnected) => {
                self.control_panel.set_status("Error: export thread stopped");
                self.control_panel.exporting = false;
            }
        }
    }

    fn show_header(&self, ui: &mut egui::Ui) {
        if let Some(logo) = &self.logo {
            ui.add(egui::Image::new(logo).max_width(200.0));
            ui.add_space(8.0);
        }
        ui.label(RichText::new(&self.header.title).size(30.0).strong());
        ui.label(RichText::new(&self.header.subtitle).size(16.0).italics());
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(10.0);
    }
}

impl eframe::App for ReportApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_export_results();
        if self.control_panel.exporting {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(220.0)
            .max_width(300.0)
            .show(ctx, |ui| {
                if self.control_panel.show(ui) == ControlPanelAction::Export {
                    self.start_export();
                }
            });

        // Central panel - Report
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.show_header(ui);
                    self.report_view.show(ui, &self.report);
                });
        });
    }
}
