//! Line chart rendering to image files.
//!
//! Plotters is built without its system font stack. Captions and axis labels
//! are drawn with DejaVu Sans, embedded in the binary and registered as the
//! `sans-serif` family before the first chart is drawn.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use thiserror::Error;

use crate::traits::ChartRenderer;

const CHART_SIZE: (u32, u32) = (800, 600);
const FONT_FAMILY: &str = "sans-serif";
static FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to render chart to {}: {message}", path.display())]
    Render { path: PathBuf, message: String },
    #[error("embedded chart font could not be loaded")]
    Font,
}

/// Register the embedded font once per process.
fn ensure_font() -> Result<(), ChartError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| {
        register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES).is_ok()
    });
    if ok { Ok(()) } else { Err(ChartError::Font) }
}

/// A single line series with its labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<(f64, f64)>,
    pub color: (u8, u8, u8),
}

impl LineChart {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        points: Vec<(f64, f64)>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            points,
            color: (255, 0, 0),
        }
    }

    pub fn with_color(mut self, color: (u8, u8, u8)) -> Self {
        self.color = color;
        self
    }

    /// Axis ranges padded so a flat or single-point series still has area.
    pub fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        let finite = || self.points.iter().filter(|(x, y)| x.is_finite() && y.is_finite());

        let (mut x0, mut x1, mut y0, mut y1) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for &(x, y) in finite() {
            x0 = x0.min(x);
            x1 = x1.max(x);
            y0 = y0.min(y);
            y1 = y1.max(y);
        }
        if finite().next().is_none() {
            return ([0.0, 1.0], [0.0, 1.0]);
        }

        let pad = |lo: f64, hi: f64| {
            if hi - lo < f64::EPSILON {
                [lo - 1.0, hi + 1.0]
            } else {
                [lo, hi]
            }
        };
        (pad(x0, x1), pad(y0, y1))
    }
}

/// Renders PNG files with the plotters bitmap backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersRenderer;

impl PlottersRenderer {
    fn draw(chart: &LineChart, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let ([x0, x1], [y0, y1]) = chart.bounds();
        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, (FONT_FAMILY, 20))
            .margin(10)
            .set_label_area_size(LabelAreaPosition::Left, 50)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x0..x1, y0..y1)?;

        ctx.configure_mesh()
            .label_style((FONT_FAMILY, 12))
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .draw()?;

        let (r, g, b) = chart.color;
        let points = chart
            .points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite());
        ctx.draw_series(LineSeries::new(points, &RGBColor(r, g, b)))?;

        root.present()?;
        Ok(())
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render_line(&self, chart: &LineChart, path: &Path) -> Result<(), ChartError> {
        ensure_font()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ChartError::OutputDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        Self::draw(chart, path).map_err(|e| ChartError::Render {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        tracing::info!("Wrote chart '{}' to {}", chart.title, path.display());
        Ok(())
    }
}
