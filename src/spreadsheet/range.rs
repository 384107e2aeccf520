use crate::error::CheckinError;
use crate::helpers::reference::col_to_index;
use crate::helpers::reference::index_to_reference;
use crate::helpers::reference::row_to_index;
use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;
use thiserror::Error;

static RANGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]*)(\d*)(:([A-Z]*)(\d*))?$").expect("Hardcode regex pattern"));

/// Errors related to A1-style range parsing.
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

/// An A1-style cell range with optional boundaries, used to window a sheet read.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Range {
    /// Lower row bound (0-based index), None for unbounded
    pub row_lower_bound: Option<usize>,
    /// Upper row bound (0-based index), None for unbounded
    pub row_upper_bound: Option<usize>,
    /// Lower column bound (0-based index), None for unbounded
    pub col_lower_bound: Option<usize>,
    /// Upper column bound (0-based index), None for unbounded
    pub col_upper_bound: Option<usize>,
}

impl Range {
    /// Whether 0-based (row, col) falls inside every specified bound.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.row_lower_bound.map(|bound| bound <= row).unwrap_or(true)
            && self.row_upper_bound.map(|bound| row <= bound).unwrap_or(true)
            && self.col_lower_bound.map(|bound| bound <= col).unwrap_or(true)
            && self.col_upper_bound.map(|bound| col <= bound).unwrap_or(true)
    }

    /// True once `row` is past the upper row bound, so readers can stop early.
    pub fn after_row_upper_bound(&self, row: usize) -> bool {
        self.row_upper_bound.map(|bound| bound < row).unwrap_or(false)
    }
}

impl TryFrom<&str> for Range {
    type Error = CheckinError;

    /// Parses "A1", "B2:C5", "A:C", "1:10" or "A1:Z1000" (case-insensitive).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim().to_ascii_uppercase();
        let captures = RANGE_PATTERN
            .captures(value.as_str())
            .ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let part = |index: usize| captures.get(index).map(|matcher| matcher.as_str());
        Ok(Range {
            col_lower_bound: part(1).and_then(col_to_index),
            row_lower_bound: part(2).and_then(row_to_index),
            col_upper_bound: part(4).and_then(col_to_index),
            row_upper_bound: part(5).and_then(row_to_index),
        })
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lower = index_to_reference(self.row_lower_bound.unwrap_or(0), self.col_lower_bound.unwrap_or(0));
        match (self.row_upper_bound, self.col_upper_bound) {
            (Some(row), Some(col)) => write!(f, "{}:{}", lower, index_to_reference(row, col)),
            _ => write!(f, "{}", lower),
        }
    }
}
