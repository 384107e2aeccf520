//! # Workbook Import
//!
//! Reads the first worksheet of an uploaded Excel 2007+ workbook (`.xlsx`, `.xlsm`)
//! into a [`Table`]. Shared strings, inline strings, booleans, ISO dates and number
//! formats that denote dates are all resolved to tagged [`Value`](crate::table::Value)s;
//! the header row is kept as row 0.
use crate::error::CheckinError;
use crate::error::ResultMessage;
use crate::spreadsheet::range::Range;
use crate::spreadsheet::xlsx::XlsxWorkbook;
use crate::table::Table;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

pub(crate) mod cell;
pub(crate) mod excel;
pub mod range;
pub(crate) mod sheet;
pub(crate) mod xlsx;

/// Compound File Binary signature: legacy `.xls` files and password-protected packages.
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Unsupported workbook format: legacy .xls or password-protected file")]
    UnsupportedFormat,

    #[error("Workbook contains no worksheet")]
    EmptyWorkbook,

    #[error("Worksheet #{0} not found")]
    SheetNotFound(usize),

    #[error("Missing workbook part '{0}'")]
    MissingPart(String),

    #[error("Invalid cell value at '{0}': {1}")]
    CellValueError(String, String),

    #[error("Worksheet spans {rows} rows by {cols} columns, more than {limit} cells")]
    TooLarge { rows: usize, cols: usize, limit: usize },
}

/// Reads the first worksheet of `bytes`, windowed to `range` when given.
///
/// # Errors
///
/// Fails when the bytes are not an OOXML package, the package has no worksheet,
/// or a cell holds a value that contradicts its declared type.
pub fn read_workbook(bytes: &[u8], range: Option<Range>) -> Result<Table, CheckinError> {
    if bytes.starts_with(&CFB_SIGNATURE) {
        Err(SpreadsheetError::UnsupportedFormat)?
    }
    let mut workbook = XlsxWorkbook::open(Cursor::new(bytes))?;
    debug!(sheets = ?workbook.sheet_names(), "opened workbook");
    let shared_strings = workbook.load_shared_strings().with_prefix("Failed to read shared strings")?;
    let sheet = workbook.read_sheet(0, range).with_prefix("Failed to read first worksheet")?;
    if sheet.is_empty() {
        debug!(sheet = %sheet.name, "worksheet has no cells in range");
    } else {
        debug!(sheet = %sheet.name, cells = sheet.cells.len(), "read worksheet");
    }
    Ok(sheet.into_table(&shared_strings)?)
}
