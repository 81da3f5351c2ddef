use super::model::ForecastRequest;
use super::window::WindowedSeries;
use crate::config::HorizonPolicy;
use crate::error::{ForecastError, Result};

/// Combine windowed series into a single request.
///
/// The request horizon comes from the series' local horizons, in series
/// order. Under [`HorizonPolicy::Strict`] they must all agree; under
/// [`HorizonPolicy::LastWins`] the last one is used as-is. Series without
/// future covariates do not vote.
pub fn build_request(
    series: Vec<WindowedSeries>,
    policy: HorizonPolicy,
) -> Result<ForecastRequest> {
    let mut horizon: Option<usize> = None;

    for s in &series {
        let Some(local) = s.local_horizon else {
            continue;
        };
        match (policy, horizon) {
            (HorizonPolicy::Strict, Some(expected)) if expected != local => {
                return Err(ForecastError::InconsistentHorizon {
                    item_id: s.record.item_id.clone(),
                    expected,
                    found: local,
                });
            }
            _ => horizon = Some(local),
        }
    }

    let horizon = horizon.ok_or(ForecastError::MissingHorizon)?;
    Ok(ForecastRequest {
        records: series.into_iter().map(|s| s.record).collect(),
        horizon,
    })
}
