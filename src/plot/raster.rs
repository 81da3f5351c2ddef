use std::io::Cursor;
use std::sync::OnceLock;

use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::{
    BitMapBackend, ChartBuilder, Circle, DrawingArea, DrawingAreaErrorKind, EmptyElement,
    IntoDrawingArea, IntoFont, PathElement, Polygon, RGBColor, Rectangle, SeriesLabelPosition,
    ShapeStyle,
};
use plotters::style::{register_font, Color as _, FontStyle};
use plotters_bitmap::BitMapBackendError;

use super::{ChartSpec, Marker};
use crate::collab::ChartRenderer;
use crate::color::{ChartPalette, Rgb};
use crate::config::RenderConfig;
use crate::error::{ForecastError, Result};

/// Family name the bundled face is registered under. Every text style in
/// the chart asks for it.
const FONT_FAMILY: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const MIN_WIDTH: u32 = 160;
const MIN_HEIGHT: u32 = 120;
const MARKER_SIZE: i32 = 3;

type PlotResult = std::result::Result<(), DrawingAreaErrorKind<BitMapBackendError>>;

// ---------------------------------------------------------------------------
// PNG renderer
// ---------------------------------------------------------------------------

/// Draws a [`ChartSpec`] with plotters into an RGB buffer and encodes it as
/// PNG: title, labelled axes with a grid, the shaded band, both lines with
/// markers, and a legend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngRenderer;

impl ChartRenderer for PngRenderer {
    fn render(&self, chart: &ChartSpec, config: &RenderConfig) -> Result<Vec<u8>> {
        let (w, h) = (config.width, config.height);
        if w < MIN_WIDTH || h < MIN_HEIGHT {
            return Err(ForecastError::Render(format!(
                "canvas {w}x{h} is smaller than the minimum {MIN_WIDTH}x{MIN_HEIGHT}"
            )));
        }
        ensure_font()?;

        let mut buffer = vec![0u8; w as usize * h as usize * 3];
        {
            let area = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
            draw(&area, chart, &config.palette)
                .map_err(|e| ForecastError::Render(e.to_string()))?;
        }

        let img = RgbImage::from_raw(w, h, buffer).ok_or_else(|| {
            ForecastError::Render("pixel buffer does not match the canvas size".to_string())
        })?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| ForecastError::Render(e.to_string()))?;
        log::debug!("rendered '{}' ({w}x{h}, {} bytes)", chart.title, bytes.len());
        Ok(bytes)
    }
}

/// Register the bundled face once per process.
fn ensure_font() -> Result<()> {
    static REGISTERED: OnceLock<std::result::Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES)
                .map_err(|_| "bundled font: InvalidFont".to_string())
        })
        .clone()
        .map_err(ForecastError::Render)
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

fn draw(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    spec: &ChartSpec,
    palette: &ChartPalette,
) -> PlotResult {
    let background = rgb(palette.background);
    let axis = rgb(palette.axis);
    let grid = rgb(palette.grid);
    area.fill(&background)?;

    let (x_min, x_max, y_min, y_max) = spec.bounds();
    let (x0, x1) = padded(x_min, x_max, 0.02);
    let (y0, y1) = padded(y_min, y_max, 0.05);

    let mut chart = ChartBuilder::on(area)
        .caption(&spec.title, (FONT_FAMILY, 20.0).into_font())
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(56)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_style(&axis)
        .bold_line_style(&grid)
        .light_line_style(&background)
        .label_style((FONT_FAMILY, 12.0).into_font().color(&axis))
        .axis_desc_style((FONT_FAMILY, 14.0).into_font())
        .draw()?;

    // Band first so the lines stay on top of it.
    let band = &spec.band;
    let fill = rgb(band.color).mix(f64::from(band.opacity.clamp(0.0, 1.0)));
    let outline: Vec<(f64, f64)> = band
        .x
        .iter()
        .copied()
        .zip(band.upper.iter().copied())
        .chain(band.x.iter().copied().zip(band.lower.iter().copied()).rev())
        .collect();
    if outline.len() >= 3 {
        chart.draw_series(std::iter::once(Polygon::new(outline, fill.filled())))?;
    } else {
        let stroke = ShapeStyle::from(&fill).stroke_width(MARKER_SIZE as u32 * 2);
        chart.draw_series(std::iter::once(PathElement::new(outline, stroke)))?;
    }

    for line in [&spec.history, &spec.forecast] {
        let color = rgb(line.color);
        let points: Vec<(f64, f64)> = line.x.iter().copied().zip(line.y.iter().copied()).collect();
        chart.draw_series(std::iter::once(PathElement::new(
            points.clone(),
            ShapeStyle::from(&color).stroke_width(2),
        )))?;
        match line.marker {
            Marker::Circle => {
                chart.draw_series(
                    points
                        .iter()
                        .map(|&p| Circle::new(p, MARKER_SIZE, color.filled())),
                )?;
            }
            Marker::Square => {
                let corner = (MARKER_SIZE, MARKER_SIZE);
                chart.draw_series(points.iter().map(|&p| {
                    EmptyElement::at(p)
                        + Rectangle::new([(-corner.0, -corner.1), corner], color.filled())
                }))?;
            }
        }
    }

    // Legend entries come from the spec so their order and swatch colours
    // match it exactly.
    for entry in &spec.legend {
        let swatch = rgb(entry.color);
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
            .label(entry.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 18, y + 5)], swatch.filled()));
    }
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&background)
        .border_style(&axis)
        .label_font((FONT_FAMILY, 13.0).into_font())
        .draw()?;

    area.present()?;
    Ok(())
}

fn rgb(color: Rgb) -> RGBColor {
    let [r, g, b] = color.0;
    RGBColor(r, g, b)
}

/// Widen a range by `frac` on both sides; degenerate ranges get a unit span.
fn padded(lo: f64, hi: f64, frac: f64) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = (hi - lo) * frac;
    (lo - pad, hi + pad)
}
