//! Click Report - ad click exploratory analysis dashboard
//!
//! Loads both click sources, answers the report questions and shows them in
//! a window, as Markdown, or as exported PNG charts.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use click_report::analysis::Report;
use click_report::charts::StaticChartRenderer;
use click_report::data::{DataLoader, Normalizer};
use click_report::gui::{ControlPanel, ReportApp, SourceSummary};
use click_report::narrative::{self, PageHeader};
use eframe::egui;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "click-report")]
#[command(about = "Exploratory report over ad click events", long_about = None)]
struct Args {
    /// Source A, dates packed as YY/MM/DD
    #[arg(long, default_value = "hlm.csv")]
    source_a: PathBuf,

    /// Source B, calendar dates
    #[arg(long, default_value = "pc.csv")]
    source_b: PathBuf,

    /// Logo shown above the page title
    #[arg(long, default_value = "images/logo.png")]
    logo: PathBuf,

    #[arg(long, default_value = "Click Analysis")]
    title: String,

    #[arg(long, default_value = "Ad click events report")]
    subtitle: String,

    /// Write PNG charts and report.json into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print the report as Markdown
    #[arg(long)]
    markdown: bool,

    /// Do not open the dashboard window
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("click_report=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let packed = DataLoader::load_csv(&args.source_a)
        .with_context(|| format!("loading {}", args.source_a.display()))?;
    let calendar = DataLoader::load_csv(&args.source_b)
        .with_context(|| format!("loading {}", args.source_b.display()))?;
    let table = Normalizer::unify(&packed, &calendar).context("normalizing click sources")?;

    info!(rows = table.height(), "Unified click table");

    let report = Report::build(&table);

    let header = PageHeader {
        title: args.title,
        subtitle: args.subtitle,
    };

    if args.markdown {
        println!("{}", narrative::markdown(&report, &header));
    }

    if let Some(dir) = &args.export {
        let files = StaticChartRenderer::export(dir, &report)
            .with_context(|| format!("exporting charts to {}", dir.display()))?;
        for file in files {
            info!(file = %file.display(), "Written");
        }
    }

    if args.headless {
        return Ok(());
    }

    let control_panel = ControlPanel::new(
        vec![
            SourceSummary {
                name: packed.name.clone(),
                rows: packed.height(),
            },
            SourceSummary {
                name: calendar.name.clone(),
                rows: calendar.height(),
            },
        ],
        table.height(),
        args.export.unwrap_or_else(|| PathBuf::from("click_report_export")),
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title(header.title.clone()),
        ..Default::default()
    };

    let logo = args.logo;
    eframe::run_native(
        "Click Report",
        options,
        Box::new(move |cc| {
            Ok(Box::new(ReportApp::new(
                cc,
                report,
                header,
                &logo,
                control_panel,
            )))
        }),
    )
    .map_err(|e| anyhow!("dashboard failed: {}", e))
}
