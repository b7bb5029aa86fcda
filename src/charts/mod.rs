//! Charts module - Chart rendering
//!
//! Colours and pie geometry are backend neutral; `plotter` draws them with
//! egui for the dashboard and `renderer` with plotters for PNG export.

mod plotter;
mod renderer;

pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer};

use std::f64::consts::TAU;

/// Line colour of the click series.
pub const ACCENT_RGB: (u8, u8, u8) = (248, 76, 36);

/// Colours for the known devices, in `KNOWN_DEVICES` order.
const DEVICE_RGB: [(u8, u8, u8); 3] = [
    (99, 110, 250), // mobile
    (239, 85, 59),  // computer
    (0, 204, 150),  // tablet
];

/// Fallback colours for any other device label.
const PALETTE_RGB: [(u8, u8, u8); 6] = [
    (171, 99, 250),
    (255, 161, 90),
    (25, 211, 243),
    (255, 102, 146),
    (182, 232, 128),
    (255, 151, 255),
];

/// Stable colour for a device label.
pub fn device_rgb(device: &str) -> (u8, u8, u8) {
    use crate::analysis::KNOWN_DEVICES;

    if let Some(i) = KNOWN_DEVICES.iter().position(|d| *d == device) {
        return DEVICE_RGB[i];
    }
    let key: usize = device.bytes().map(usize::from).sum();
    PALETTE_RGB[key % PALETTE_RGB.len()]
}

/// Share of each value in the total; all zero when the total is zero.
pub fn fractions(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / total).collect()
}

/// One pie slice on the unit circle, y axis pointing up.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    /// Fan outline: centre first, then points along the arc.
    pub points: Vec<(f64, f64)>,
    /// Direction of the slice's middle, for labels.
    pub mid: (f64, f64),
}

impl PieSlice {
    /// Triangles covering the slice, each convex.
    pub fn triangles(&self) -> impl Iterator<Item = [(f64, f64); 3]> + '_ {
        let center = self.points[0];
        self.points[1..]
            .windows(2)
            .map(move |pair| [center, pair[0], pair[1]])
    }
}

/// Slices for `fractions`, clockwise from twelve o'clock.
pub fn pie_slices(fractions: &[f64]) -> Vec<PieSlice> {
    let point = |turn: f64| ((turn * TAU).sin(), (turn * TAU).cos());

    let mut start = 0.0;
    fractions
        .iter()
        .map(|&fraction| {
            let steps = ((fraction * 96.0).ceil() as usize).max(1);
            let mut points = vec![(0.0, 0.0)];
            points.extend((0..=steps).map(|k| point(start + fraction * k as f64 / steps as f64)));
            let slice = PieSlice {
                points,
                mid: point(start + fraction / 2.0),
            };
            start += fraction;
            slice
        })
        .collect()
}
