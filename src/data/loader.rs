use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::model::{Cell, Column, Table, ITEM_ID_COLUMN};
use crate::error::{ForecastError, Result};

/// Cell texts read as missing values, besides the empty string.
const MISSING_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Decode a base64-wrapped delimited table with a header row.
pub fn decode_table(encoded: &str, delimiter: u8) -> Result<Table> {
    // Tolerate line-wrapped base64.
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| ForecastError::Decode(format!("payload is not valid base64: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| ForecastError::Decode(format!("payload is not UTF-8 text: {e}")))?;
    parse_delimited(&text, delimiter)
}

/// Encode raw table text the way callers hand it to [`decode_table`].
pub fn encode_table(text: &str) -> String {
    BASE64.encode(text.as_bytes())
}

/// Parse delimited text. The first row names the columns; every data row
/// must have exactly as many fields as the header.
pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ForecastError::Decode(format!("reading header row: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(ForecastError::Decode("header row is empty".to_string()));
    }
    for (i, name) in headers.iter().enumerate() {
        if headers[..i].contains(name) {
            return Err(ForecastError::Decode(format!("duplicate column name '{name}'")));
        }
    }

    let mut columns: Vec<Column> = headers
        .iter()
        .map(|name| Column {
            name: name.clone(),
            cells: Vec::new(),
        })
        .collect();

    let mut n_rows = 0;
    for (row_no, result) in reader.records().enumerate() {
        let record =
            result.map_err(|e| ForecastError::Decode(format!("data row {row_no}: {e}")))?;
        for (column, value) in columns.iter_mut().zip(record.iter()) {
            let cell = if column.name == ITEM_ID_COLUMN {
                identifier_cell(value)
            } else {
                guess_cell(value)
            };
            column.cells.push(cell);
        }
        n_rows += 1;
    }

    Ok(Table { columns, n_rows })
}

// ---------------------------------------------------------------------------
// Cell inference
// ---------------------------------------------------------------------------

/// Numbers become `Number`, null tokens become `Missing`, everything else
/// (including booleans) stays text.
fn guess_cell(raw: &str) -> Cell {
    let s = raw.trim();
    if s.is_empty() || MISSING_TOKENS.contains(&s) {
        return Cell::Missing;
    }
    match s.parse::<f64>() {
        // Rust also accepts "inf"/"infinity"; keep those as text.
        Ok(v) if v.is_finite() => Cell::Number(v),
        _ => Cell::Text(s.to_string()),
    }
}

/// Identifiers are kept verbatim so that "007" stays "007".
fn identifier_cell(raw: &str) -> Cell {
    let s = raw.trim();
    if s.is_empty() || MISSING_TOKENS.contains(&s) {
        Cell::Missing
    } else {
        Cell::Text(s.to_string())
    }
}
