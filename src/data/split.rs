use super::model::{Cell, Table, ITEM_ID_COLUMN};
use crate::error::{ForecastError, Result};

// ---------------------------------------------------------------------------
// Series grouping: which rows belong to which identifier
// ---------------------------------------------------------------------------

/// Rows of one series, in original table order.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesGroup {
    pub item_id: String,
    pub rows: Vec<usize>,
}

/// Series identifiers in first-occurrence order.
///
/// Without an `item_id` column every row belongs to `synthetic_id`. A row
/// whose `item_id` cell is missing cannot be assigned and is rejected.
pub fn series_ids(table: &Table, synthetic_id: &str) -> Result<Vec<String>> {
    let Some(col) = table.column_index(ITEM_ID_COLUMN) else {
        return Ok(vec![synthetic_id.to_string()]);
    };

    let mut ids: Vec<String> = Vec::new();
    for (row, cell) in table.columns[col].cells.iter().enumerate() {
        let id = row_identifier(cell, row)?;
        if !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

/// Partition the table's rows into one group per identifier.
///
/// Groups follow the order of `ids`; rows keep their table order inside
/// each group. An identifier with no matching rows yields an empty group.
pub fn split_series(table: &Table, ids: &[String]) -> Result<Vec<SeriesGroup>> {
    let Some(col) = table.column_index(ITEM_ID_COLUMN) else {
        // Single synthetic series: every row.
        return Ok(ids
            .iter()
            .map(|id| SeriesGroup {
                item_id: id.clone(),
                rows: (0..table.len()).collect(),
            })
            .collect());
    };

    let cells = &table.columns[col].cells;
    ids.iter()
        .map(|id| -> Result<SeriesGroup> {
            let mut rows = Vec::new();
            for (row, cell) in cells.iter().enumerate() {
                if row_identifier(cell, row)? == id.as_str() {
                    rows.push(row);
                }
            }
            Ok(SeriesGroup {
                item_id: id.clone(),
                rows,
            })
        })
        .collect()
}

fn row_identifier(cell: &Cell, row: usize) -> Result<&str> {
    match cell {
        Cell::Text(s) => Ok(s.as_str()),
        _ => Err(ForecastError::Decode(format!(
            "data row {row} has no {ITEM_ID_COLUMN}"
        ))),
    }
}
