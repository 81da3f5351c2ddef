//! Chart content for one forecast, independent of how it is drawn.

pub mod raster;

use serde::Serialize;

use crate::color::Rgb;
use crate::config::RenderConfig;
use crate::reconcile::ReconciledSeries;

pub use raster::PngRenderer;

// ---------------------------------------------------------------------------
// Chart specification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Marker {
    Circle,
    Square,
}

/// A polyline with a marker at every point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub color: Rgb,
    pub marker: Marker,
}

/// A shaded region between two curves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandSeries {
    pub label: String,
    pub x: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub color: Rgb,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgb,
}

/// Everything a renderer needs to draw one forecast chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub history: LineSeries,
    pub forecast: LineSeries,
    pub band: BandSeries,
    pub legend: Vec<LegendEntry>,
}

impl ChartSpec {
    /// Bounds over every plotted value: `(x_min, x_max, y_min, y_max)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let xs = self.history.x.iter().chain(&self.forecast.x);
        let ys = self
            .history
            .y
            .iter()
            .chain(&self.forecast.y)
            .chain(&self.band.lower)
            .chain(&self.band.upper);

        let (x_min, x_max) = min_max(xs);
        let (y_min, y_max) = min_max(ys);
        (x_min, x_max, y_min, y_max)
    }
}

fn min_max<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Build the chart for a reconciled series.
///
/// History occupies x = `0..L`, the forecast and its band x = `L..L+H`.
pub fn build_chart(series: &ReconciledSeries, config: &RenderConfig) -> ChartSpec {
    let history_len = series.history.len();
    let horizon = series.forecast.mean.len();
    let palette = &config.palette;

    let history_x: Vec<f64> = (0..history_len).map(|i| i as f64).collect();
    let forecast_x: Vec<f64> = (history_len..history_len + horizon)
        .map(|i| i as f64)
        .collect();

    let history = LineSeries {
        label: config.history_label.clone(),
        x: history_x,
        y: series.history.clone(),
        color: palette.history,
        marker: Marker::Circle,
    };
    let forecast = LineSeries {
        label: config.forecast_label.clone(),
        x: forecast_x.clone(),
        y: series.forecast.mean.clone(),
        color: palette.forecast,
        marker: Marker::Square,
    };
    let band = BandSeries {
        label: config.band_label.clone(),
        x: forecast_x,
        lower: series.forecast.p10.clone(),
        upper: series.forecast.p90.clone(),
        color: palette.band,
        opacity: config.band_opacity,
    };

    let legend = vec![
        LegendEntry {
            label: history.label.clone(),
            color: history.color,
        },
        LegendEntry {
            label: forecast.label.clone(),
            color: forecast.color,
        },
        LegendEntry {
            label: band.label.clone(),
            color: band.color.over(palette.background, band.opacity),
        },
    ];

    ChartSpec {
        title: format!("{} {}", config.title_prefix, series.item_id),
        x_label: config.x_label.clone(),
        y_label: config.y_label.clone(),
        history,
        forecast,
        band,
        legend,
    }
}
