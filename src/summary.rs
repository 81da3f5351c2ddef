//! Descriptive statistics and the per-series text report.

use crate::config::RenderConfig;

/// Statistics shown in a series report.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    /// Unrounded population mean of the history.
    pub history_mean: f64,
    /// Unrounded population standard deviation of the history.
    pub history_stddev: f64,
    pub last_value: f64,
    /// Forecast mean, each step rounded to two decimals.
    pub forecast_mean: Vec<f64>,
}

/// Summarise a non-empty history and its forecast. Returns `None` for an
/// empty history.
pub fn summarize(history: &[f64], forecast_mean: &[f64]) -> Option<SeriesSummary> {
    let &last_value = history.last()?;
    let n = history.len() as f64;
    let mean = history.iter().sum::<f64>() / n;
    let variance = history.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Some(SeriesSummary {
        history_mean: mean,
        history_stddev: variance.sqrt(),
        last_value,
        forecast_mean: forecast_mean.iter().map(|&v| round2(v)).collect(),
    })
}

/// Round to two decimals from the exact binary value, ties to even, so
/// `2.675` (stored just below the tie) becomes `2.67`.
pub fn round2(v: f64) -> f64 {
    format!("{v:.2}").parse().unwrap_or(v)
}

/// Render the Markdown report for one series. Identical inputs always give
/// an identical string.
pub fn format_report(
    item_id: &str,
    summary: &SeriesSummary,
    image_ref: &str,
    config: &RenderConfig,
) -> String {
    let forecast = summary
        .forecast_mean
        .iter()
        .map(|v| format_number(*v))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "## Forecast results: {item_id}\n\
         \n\
         **Statistics:**\n\
         - History mean: {mean}\n\
         - History standard deviation: {std}\n\
         - Last value: {last}\n\
         \n\
         **Forecast (mean):** [{forecast}]\n\
         \n\
         **Forecast chart:**\n\
         \n\
         ![{label}]({image_ref})\n",
        mean = format_number(round2(summary.history_mean)),
        std = format_number(round2(summary.history_stddev)),
        last = format_number(summary.last_value),
        label = config.image_label,
    )
}

/// Shortest decimal form; integral values print without a fraction.
fn format_number(v: f64) -> String {
    // Normalise -0.0 so rounding tiny negatives does not print "-0".
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{v}")
}
