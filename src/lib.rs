//! Click Report - ad click exploratory analysis
//!
//! Loads the two click sources, normalizes them into one table, answers the
//! four report questions and presents them as a dashboard, Markdown or PNGs.

pub mod analysis;
pub mod charts;
pub mod data;
pub mod gui;
pub mod narrative;
