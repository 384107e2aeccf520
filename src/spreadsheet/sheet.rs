use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::range::Range;
use crate::spreadsheet::SpreadsheetError;
use crate::table::Table;
use crate::table::Value;

/// Upper bound on the cells of the dense table built from one worksheet.
pub(crate) const MAX_TABLE_CELLS: usize = 1 << 22;

/// Cells collected from one worksheet, in document order, clipped to a range.
pub(crate) struct Sheet {
    pub(crate) name: String,
    pub(crate) cells: Vec<Cell>,
    /// Window requested by the caller
    range: Range,
    /// Actual data bounds (0-based, inclusive), determined from the pushed cells
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(name: &str, range: Option<Range>) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            range: range.unwrap_or_default(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn contains(&self, row: usize, col: usize) -> bool {
        self.range.contains(row, col)
    }

    pub(crate) fn after_row_upper_bound(&self, row: usize) -> bool {
        self.range.after_row_upper_bound(row)
    }

    /// Adds a cell, widening the data bounds. Cells outside the range are dropped.
    pub(crate) fn push(&mut self, cell: Cell) {
        if !self.contains(cell.row, cell.col) {
            return;
        }
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|bound| row < bound).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|bound| bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|bound| col < bound).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|bound| bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Lays the cells out as a dense table spanning the data bounds.
    /// Every row has the same width; positions without a cell become `Value::Empty`.
    pub(crate) fn into_table(self, shared_strings: &[String]) -> Result<Table, SpreadsheetError> {
        let (Some(row_lower), Some(row_upper), Some(col_lower), Some(col_upper)) =
            (self.row_lower_bound, self.row_upper_bound, self.col_lower_bound, self.col_upper_bound)
        else {
            return Ok(Table::default());
        };
        let width = col_upper - col_lower + 1;
        let height = row_upper - row_lower + 1;
        if width.saturating_mul(height) > MAX_TABLE_CELLS {
            return Err(SpreadsheetError::TooLarge { rows: height, cols: width, limit: MAX_TABLE_CELLS });
        }
        let mut rows = vec![vec![Value::Empty; width]; height];
        for cell in &self.cells {
            rows[cell.row - row_lower][cell.col - col_lower] = cell.to_value(shared_strings)?;
        }
        Ok(Table::new(rows))
    }
}
