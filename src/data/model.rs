use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Column whose values, when present, assign rows to series.
pub const ITEM_ID_COLUMN: &str = "item_id";

// ---------------------------------------------------------------------------
// Cell – a single value in a table column
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell, mirroring what a dataframe reader infers.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Missing => write!(f, "<missing>"),
        }
    }
}

impl Cell {
    /// The numeric value, if this cell holds one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

// ---------------------------------------------------------------------------
// Table – the decoded dataset
// ---------------------------------------------------------------------------

/// One named column; `cells[i]` belongs to row `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    /// A column is numeric when none of its cells is text. Missing cells
    /// are allowed, so an all-missing column is numeric too.
    pub fn is_numeric(&self) -> bool {
        self.cells.iter().all(|c| !matches!(c, Cell::Text(_)))
    }
}

/// A rectangular table. Read-only once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Columns in header order.
    pub columns: Vec<Column>,
    /// Number of data rows (every column has exactly this many cells).
    pub n_rows: usize,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Indices of the numeric columns in header order. The `item_id`
    /// column is never treated as numeric.
    pub fn numeric_columns(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name != ITEM_ID_COLUMN && c.is_numeric())
            .map(|(i, _)| i)
            .collect()
    }

    /// Numeric value at (`column`, `row`), `None` for missing cells.
    pub fn value(&self, column: usize, row: usize) -> Option<f64> {
        self.columns[column].cells[row].as_f64()
    }

    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }
}

// ---------------------------------------------------------------------------
// Forecast request
// ---------------------------------------------------------------------------

/// One series as sent to the inference service.
///
/// `past_covariates` sequences are aligned to `target` and may contain
/// missing entries (`null` on the wire). `future_covariates` hold only
/// the non-missing values past the end of the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub target: Vec<f64>,
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past_covariates: Option<BTreeMap<String, Vec<Option<f64>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future_covariates: Option<BTreeMap<String, Vec<f64>>>,
}

/// All series of one ingestion call plus the single horizon applied to them.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub records: Vec<SeriesRecord>,
    pub horizon: usize,
}

impl ForecastRequest {
    /// The target histories in series order, kept for reconciliation.
    pub fn histories(&self) -> Vec<SeriesHistory> {
        self.records
            .iter()
            .map(|r| SeriesHistory {
                item_id: r.item_id.clone(),
                target: r.target.clone(),
            })
            .collect()
    }
}

/// The observed part of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesHistory {
    pub item_id: String,
    pub target: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Forecast result
// ---------------------------------------------------------------------------

/// Point forecast and the bounds of its 80% interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantiles {
    pub mean: Vec<f64>,
    #[serde(rename = "0.1")]
    pub p10: Vec<f64>,
    #[serde(rename = "0.9")]
    pub p90: Vec<f64>,
}

/// Inference output keyed by series identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastResult {
    pub items: BTreeMap<String, Quantiles>,
}

impl ForecastResult {
    pub fn get(&self, item_id: &str) -> Option<&Quantiles> {
        self.items.get(item_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Terminal artifact for one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesReport {
    pub item_id: String,
    /// Rounded to two decimals.
    pub history_mean: f64,
    /// Population standard deviation, rounded to two decimals.
    pub history_stddev: f64,
    /// Last observed value, unrounded.
    pub last_value: f64,
    /// Each element rounded to two decimals.
    pub forecast_mean: Vec<f64>,
    /// Reference returned by the artifact store.
    pub image_ref: String,
    /// Formatted Markdown report.
    pub text: String,
}
