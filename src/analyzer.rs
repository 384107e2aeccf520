//! # Column Analysis
//!
//! Finds the columns of an attendee [`Table`] that can identify a row on their own
//! (no duplicated value across every row, header included) and the first column
//! that holds email addresses.
//!
//! Column count is the header width. Rows shorter than the header read as empty
//! cells at the missing positions; rows wider than the header are rejected.
use crate::table::Table;
use crate::table::Value;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("Hardcode regex pattern")
});

#[derive(Error, Debug, PartialEq)]
pub enum AnalysisError {
    #[error("Malformed table: header row has no columns")]
    NoColumns,

    #[error("Malformed table: row {row} has {width} cells but the header has {expected}")]
    MalformedTable { row: usize, width: usize, expected: usize },
}

/// Columns whose values are pairwise distinct, in ascending order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UniqueColumns(Vec<usize>);

impl UniqueColumns {
    /// 0-based column indices.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// 1-based column numbers, as shown to users.
    pub fn numbers(&self) -> Vec<usize> {
        self.0.iter().map(|index| index + 1).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Projects a table row onto these columns, in ascending column order.
    pub fn project(&self, table: &Table, row: usize) -> Vec<Value> {
        self.0.iter().map(|&col| table.cell(row, col).clone()).collect()
    }
}

/// Checks the table shape and returns its column count.
fn column_count(table: &Table) -> Result<usize, AnalysisError> {
    if table.is_empty() {
        return Ok(0);
    }
    let expected = table.width();
    if expected == 0 {
        return Err(AnalysisError::NoColumns);
    }
    for (row, cells) in table.rows().iter().enumerate() {
        if cells.len() > expected {
            return Err(AnalysisError::MalformedTable { row, width: cells.len(), expected });
        }
    }
    Ok(expected)
}

fn is_unique_column(table: &Table, col: usize) -> bool {
    let mut seen = HashSet::with_capacity(table.len());
    (0..table.len()).all(|row| seen.insert(table.cell(row, col).canonical()))
}

/// Returns every column whose values contain no duplicates.
///
/// A table with a single row has every column unique; an empty table has none.
///
/// # Errors
///
/// Returns [`AnalysisError`] when the header is empty or a row is wider than it.
pub fn find_unique_columns(table: &Table) -> Result<UniqueColumns, AnalysisError> {
    let columns = column_count(table)?;
    let unique: Vec<usize> = (0..columns).filter(|&col| is_unique_column(table, col)).collect();
    debug!(rows = table.len(), columns, unique = ?unique, "analyzed column uniqueness");
    Ok(UniqueColumns(unique))
}

/// Returns the first unique column (0-based), stopping as soon as one is found.
pub fn first_unique_column(table: &Table) -> Result<Option<usize>, AnalysisError> {
    let columns = column_count(table)?;
    Ok((0..columns).find(|&col| is_unique_column(table, col)))
}

/// Returns the first column (0-based, left to right) where any row holds an email address.
pub fn find_email_column(table: &Table) -> Result<Option<usize>, AnalysisError> {
    let columns = column_count(table)?;
    Ok((0..columns).find(|&col| (0..table.len()).any(|row| is_valid_email(&table.cell(row, col).canonical()))))
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}
