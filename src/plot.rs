//! Chart rendering for recorded datasets.
//!
//! Renders one dependent column against the independent column as a PNG
//! image. Geometry follows the bench convention of a figure size in inches
//! scaled by a dots-per-inch factor. Hosts without usable fonts cannot draw
//! captions or axis labels, so a failed render is retried once with all text
//! disabled rather than losing the chart.

use std::ops::Range;
use std::path::Path;

use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AppResult, RecorderError};

/// How the data points are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotStyle {
    /// Points joined by line segments.
    #[default]
    Line,
    /// Unconnected circular markers.
    Scatter,
}

/// Chart rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Drawing style for the data series
    #[serde(default)]
    pub style: PlotStyle,
    /// Figure size in inches (width, height)
    #[serde(default = "default_figsize")]
    pub figsize: (u32, u32),
    /// Dots per inch; pixel dimensions are figsize scaled by this factor
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Stroke width of the line style, in points
    #[serde(default = "default_line_width")]
    pub line_width: f64,
    /// Opacity of the data series (0.0 transparent, 1.0 opaque)
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Draw a background grid behind the series
    #[serde(default = "default_grid")]
    pub grid: bool,
}

// Default value functions
fn default_figsize() -> (u32, u32) {
    (12, 6)
}

fn default_dpi() -> u32 {
    150
}

fn default_line_width() -> f64 {
    1.5
}

fn default_alpha() -> f64 {
    0.7
}

fn default_grid() -> bool {
    true
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            style: PlotStyle::default(),
            figsize: default_figsize(),
            dpi: default_dpi(),
            line_width: default_line_width(),
            alpha: default_alpha(),
            grid: default_grid(),
        }
    }
}

impl PlotConfig {
    /// Pixel dimensions of the rendered image.
    pub fn pixel_dimensions(&self) -> (u32, u32) {
        (
            self.figsize.0.saturating_mul(self.dpi).max(1),
            self.figsize.1.saturating_mul(self.dpi).max(1),
        )
    }
}

/// Renders the points to `path` as a PNG chart.
///
/// The first attempt draws the caption, axis labels and mesh. If that fails
/// (typically because the host has no usable font), the chart is rendered
/// again without any text.
pub fn render_plot(
    path: &Path,
    points: &[(f64, f64)],
    title: &str,
    x_label: &str,
    y_label: &str,
    config: &PlotConfig,
) -> AppResult<()> {
    if let Err(primary) = draw_chart(path, points, title, x_label, y_label, config, true) {
        log::warn!(
            "Text rendering failed for '{}' ({primary}); retrying without labels",
            path.display()
        );
        draw_chart(path, points, title, x_label, y_label, config, false)
            .map_err(|err| RecorderError::Render(err.to_string()))?;
    }
    Ok(())
}

fn draw_chart(
    path: &Path,
    points: &[(f64, f64)],
    title: &str,
    x_label: &str,
    y_label: &str,
    config: &PlotConfig,
    with_text: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (width, height) = config.pixel_dimensions();
    let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let (x_range, y_range) = axis_ranges(points);
    let mut builder = ChartBuilder::on(&root);
    builder.margin(10);
    if with_text {
        builder
            .caption(title, ("sans-serif", 24))
            .x_label_area_size(40)
            .y_label_area_size(60);
    }
    let mut chart = builder.build_cartesian_2d(x_range, y_range)?;

    if with_text {
        let mut mesh = chart.configure_mesh();
        if !config.grid {
            mesh.disable_mesh();
        }
        mesh.x_desc(x_label).y_desc(y_label).draw()?;
    }

    let color = BLUE.mix(config.alpha);
    match config.style {
        PlotStyle::Line => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let stroke = config.line_width.round().max(1.0) as u32;
            chart.draw_series(LineSeries::new(
                points.iter().copied(),
                color.stroke_width(stroke),
            ))?;
        }
        PlotStyle::Scatter => {
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )?;
        }
    }

    root.present()?;
    Ok(())
}

fn axis_ranges(points: &[(f64, f64)]) -> (Range<f64>, Range<f64>) {
    (
        axis_range(points.iter().map(|point| point.0)),
        axis_range(points.iter().map(|point| point.1)),
    )
}

/// Data range with a 5% margin on both sides. Degenerate and empty ranges
/// are widened so the coordinate system stays valid.
fn axis_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values.filter(|value| value.is_finite()) {
        min = min.min(value);
        max = max.max(value);
    }

    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 0.5)..(max + 0.5);
    }
    let margin = (max - min) * 0.05;
    (min - margin)..(max + margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_dimensions_scale_inches_by_dpi() {
        let config = PlotConfig::default();
        assert_eq!(config.pixel_dimensions(), (1800, 900));
    }

    #[test]
    fn axis_range_pads_the_data_span() {
        let range = axis_range([0.0, 10.0].into_iter());
        assert_eq!(range.start, -0.5);
        assert_eq!(range.end, 10.5);
    }

    #[test]
    fn axis_range_widens_degenerate_spans() {
        let range = axis_range([2.0, 2.0].into_iter());
        assert_eq!(range.start, 1.5);
        assert_eq!(range.end, 2.5);

        let empty = axis_range(std::iter::empty());
        assert_eq!(empty.start, 0.0);
        assert_eq!(empty.end, 1.0);
    }

    #[test]
    fn renders_line_chart_to_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.png");
        let points: Vec<(f64, f64)> = (0..20).map(|i| (f64::from(i), f64::from(i * i))).collect();

        let config = PlotConfig {
            figsize: (4, 3),
            dpi: 50,
            ..PlotConfig::default()
        };
        render_plot(&path, &points, "sweep", "x", "y", &config).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn renders_scatter_chart_with_single_point() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("point.png");

        let config = PlotConfig {
            style: PlotStyle::Scatter,
            figsize: (3, 3),
            dpi: 50,
            grid: false,
            ..PlotConfig::default()
        };
        render_plot(&path, &[(1.0, 2.0)], "point", "x", "y", &config).unwrap();
        assert!(path.exists());
    }
}
