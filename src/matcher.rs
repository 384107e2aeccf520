//! Resolves a decoded identifier tuple back to rows of the live table.
use crate::table::Table;
use crate::table::Value;
use serde::Serialize;

/// A matching row: 1-based row number and its cells.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchResult {
    pub row_number: usize,
    pub row_data: Vec<Value>,
}

/// How identifier values are compared against a row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Every identifier must equal some cell of the row, in any column.
    #[default]
    Anywhere,
    /// Identifier `i` must equal the cell at column `i` of this list (0-based).
    Pinned(Vec<usize>),
}

fn normalize(value: &Value) -> String {
    value.canonical().to_lowercase()
}

/// Returns every row that contains all identifier values, in table order.
///
/// Row 0 (the header) is scanned like any other row. Comparison is case-insensitive on
/// trimmed canonical strings. An empty identifier list matches nothing.
pub fn match_rows(table: &Table, identifiers: &[Value], mode: &MatchMode) -> Vec<MatchResult> {
    if identifiers.is_empty() {
        return Vec::new();
    }
    let wanted: Vec<String> = identifiers.iter().map(normalize).collect();
    table
        .rows()
        .iter()
        .enumerate()
        .filter(|(index, row)| match mode {
            MatchMode::Anywhere => {
                // Short rows read as empty up to the header width
                let cells: Vec<String> =
                    (0..table.width().max(row.len())).map(|col| normalize(table.cell(*index, col))).collect();
                wanted.iter().all(|value| cells.contains(value))
            }
            MatchMode::Pinned(columns) => {
                columns.len() == wanted.len()
                    && columns
                        .iter()
                        .zip(&wanted)
                        .all(|(&col, value)| normalize(row.get(col).unwrap_or(&Value::Empty)) == *value)
            }
        })
        .map(|(index, row)| MatchResult { row_number: index + 1, row_data: row.clone() })
        .collect()
}
