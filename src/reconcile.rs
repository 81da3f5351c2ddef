//! Matching inference results back to the series that were sent.

use crate::data::model::{ForecastResult, Quantiles, SeriesHistory};
use crate::error::{ForecastError, Result};

/// A series' history joined with its forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledSeries {
    pub item_id: String,
    pub history: Vec<f64>,
    pub forecast: Quantiles,
}

/// Look up every input series in `result`, in input order.
///
/// All-or-nothing: the first series without a result entry aborts the batch
/// with [`ForecastError::MissingItem`], and nothing is returned for the
/// series that did match. Every identifier is looked up before any entry's
/// shape is checked, so a missing series is reported ahead of a malformed
/// one. Result entries for unknown identifiers are ignored. When `horizon`
/// is given, a forecast of a different length is logged but accepted.
pub fn reconcile(
    histories: &[SeriesHistory],
    result: &ForecastResult,
    horizon: Option<usize>,
) -> Result<Vec<ReconciledSeries>> {
    let matched = histories
        .iter()
        .map(|history| {
            result
                .get(&history.item_id)
                .map(|forecast| (history, forecast))
                .ok_or_else(|| ForecastError::MissingItem {
                    item_id: history.item_id.clone(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = Vec::with_capacity(matched.len());
    for (history, forecast) in matched {
        check_shape(&history.item_id, forecast)?;

        if let Some(h) = horizon {
            if forecast.mean.len() != h {
                log::warn!(
                    "series '{}': forecast has {} steps, request horizon was {h}",
                    history.item_id,
                    forecast.mean.len()
                );
            }
        }

        out.push(ReconciledSeries {
            item_id: history.item_id.clone(),
            history: history.target.clone(),
            forecast: forecast.clone(),
        });
    }

    let extra = result.len().saturating_sub(out.len());
    if extra > 0 {
        log::debug!("{extra} result entries did not match any input series");
    }

    Ok(out)
}

fn check_shape(item_id: &str, q: &Quantiles) -> Result<()> {
    if q.mean.is_empty() {
        return Err(ForecastError::ResultShape {
            item_id: item_id.to_string(),
            reason: "empty mean forecast".to_string(),
        });
    }
    if q.p10.len() != q.mean.len() || q.p90.len() != q.mean.len() {
        return Err(ForecastError::ResultShape {
            item_id: item_id.to_string(),
            reason: format!(
                "mean has {} steps but the 0.1/0.9 quantiles have {}/{}",
                q.mean.len(),
                q.p10.len(),
                q.p90.len()
            ),
        });
    }
    Ok(())
}
