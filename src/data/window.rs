use std::collections::BTreeMap;

use super::model::{SeriesRecord, Table};
use super::split::SeriesGroup;
use crate::config::HorizonPolicy;
use crate::error::{ForecastError, Result};

// ---------------------------------------------------------------------------
// Column layout shared by every series
// ---------------------------------------------------------------------------

/// Which columns play which role. Derived once per table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRoles {
    /// Leftmost numeric column.
    pub target: usize,
    /// Remaining numeric columns, in header order.
    pub covariates: Vec<usize>,
}

impl ColumnRoles {
    pub fn detect(table: &Table) -> Result<Self> {
        let numeric = table.numeric_columns();
        let (&target, rest) = numeric.split_first().ok_or(ForecastError::NoNumericColumn)?;
        Ok(Self {
            target,
            covariates: rest.to_vec(),
        })
    }
}

// ---------------------------------------------------------------------------
// Per-series windows
// ---------------------------------------------------------------------------

/// A finished record plus the horizon its future covariates imply.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedSeries {
    pub record: SeriesRecord,
    pub local_horizon: Option<usize>,
}

/// Carve one series into target history, past covariates and future
/// covariates.
///
/// The history is the target column with missing cells dropped; its length
/// `L` is where the future window begins. Past covariates are the first `L`
/// rows of each covariate, missing cells included. Future covariates are
/// the non-missing cells from row `L` on; a column with none is left out.
pub fn window_series(
    table: &Table,
    roles: &ColumnRoles,
    group: &SeriesGroup,
    policy: HorizonPolicy,
) -> Result<WindowedSeries> {
    let target: Vec<f64> = group
        .rows
        .iter()
        .filter_map(|&row| table.value(roles.target, row))
        .collect();

    if target.is_empty() {
        return Err(ForecastError::EmptyHistory {
            item_id: group.item_id.clone(),
        });
    }
    let history_len = target.len();

    let mut record = SeriesRecord {
        target,
        item_id: group.item_id.clone(),
        past_covariates: None,
        future_covariates: None,
    };

    if roles.covariates.is_empty() {
        return Ok(WindowedSeries {
            record,
            local_horizon: None,
        });
    }

    let (past_rows, future_rows) = group.rows.split_at(history_len);

    let past: BTreeMap<String, Vec<Option<f64>>> = roles
        .covariates
        .iter()
        .map(|&col| {
            let values = past_rows.iter().map(|&row| table.value(col, row)).collect();
            (table.columns[col].name.clone(), values)
        })
        .collect();
    record.past_covariates = Some(past);

    // Header order matters here: the first qualifying column sets the horizon.
    let mut local_horizon: Option<usize> = None;
    let mut future: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for &col in &roles.covariates {
        let values: Vec<f64> = future_rows
            .iter()
            .filter_map(|&row| table.value(col, row))
            .collect();
        if values.is_empty() {
            continue;
        }
        let name = &table.columns[col].name;
        match local_horizon {
            None => local_horizon = Some(values.len()),
            Some(expected) if policy == HorizonPolicy::Strict && values.len() != expected => {
                return Err(ForecastError::FutureCovariateLength {
                    item_id: group.item_id.clone(),
                    column: name.clone(),
                    expected,
                    found: values.len(),
                });
            }
            Some(_) => {}
        }
        future.insert(name.clone(), values);
    }

    if !future.is_empty() {
        record.future_covariates = Some(future);
    }

    log::debug!(
        "series '{}': {} history points, {} rows past history, horizon {:?}",
        group.item_id,
        history_len,
        future_rows.len(),
        local_horizon
    );

    Ok(WindowedSeries {
        record,
        local_horizon,
    })
}
