//! In-memory tabular data handed from the CSV and spreadsheet parsers to the
//! classifier.
//!
//! Cells stay as text until they leave the table; [`infer_scalar`] turns a
//! cell into the JSON scalar stored in fragments and sample rows.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

/// A header row plus data rows. Rows may be shorter or longer than the
/// header; the classifier decides what a short row means.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Build a table whose first row is the header.
    pub fn from_grid(mut grid: Vec<Vec<String>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let columns = grid
            .remove(0)
            .into_iter()
            .map(|c| c.trim().to_string())
            .collect();
        Self {
            columns,
            rows: grid,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Cell text at `(row, column)`, `None` when the row is too short.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }

    /// First `n` rows as column → value maps. Missing cells become `null`.
    pub fn sample_rows(&self, n: usize) -> Vec<BTreeMap<String, Value>> {
        self.rows
            .iter()
            .take(n)
            .map(|row| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let value = row.get(i).map(|c| infer_scalar(c)).unwrap_or(Value::Null);
                        (name.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

/// Lowercase a header and keep only ASCII alphanumerics, so
/// `"Composition (%)"`, `"composition%"` and `"Composition"` compare equal.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Convert cell text into a JSON scalar: empty → `null`, integer literal →
/// integer, decimal literal → float, anything else → trimmed string.
pub fn infer_scalar(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if looks_numeric(trimmed) {
        if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }
    Value::String(trimmed.to_string())
}

// Rust's float parser also accepts "inf", "NaN" and "infinity".
fn looks_numeric(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}
