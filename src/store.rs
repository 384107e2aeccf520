//! Hosted spreadsheet collaborator.
//!
//! The check-in flow only needs four calls from the hosted spreadsheet service: create a
//! sheet from a table, share it, read a range back and paint a row. [`SheetStore`]
//! captures exactly that; [`MemorySheetStore`] keeps everything in process.
use crate::spreadsheet::range::Range;
use crate::table::Table;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Spreadsheet service error: {0}")]
    Upstream(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum ColorError {
    #[error("Invalid color '{0}', expected #RRGGBB")]
    InvalidHex(String),
}

/// RGB color with channels in `[0, 1]`, as spreadsheet APIs expect.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl Color {
    /// Parses `#RRGGBB` (the leading `#` is optional, hex digits are case-insensitive).
    pub fn from_hex(value: &str) -> Result<Color, ColorError> {
        let invalid = || ColorError::InvalidHex(value.to_owned());
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |at: usize| {
            u8::from_str_radix(&digits[at..at + 2], 16)
                .map(|byte| f32::from(byte) / 255.0)
                .map_err(|_| invalid())
        };
        Ok(Color { red: channel(0)?, green: channel(2)?, blue: channel(4)? })
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let byte = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(f, "#{:02X}{:02X}{:02X}", byte(self.red), byte(self.green), byte(self.blue))
    }
}

/// Identifies a created hosted sheet.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SheetHandle {
    pub sheet_id: String,
    pub sheet_name: String,
}

#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Creates a sheet titled `title` holding `table` (header row first).
    async fn create_sheet(&self, title: &str, table: &Table) -> Result<SheetHandle, StoreError>;

    /// Grants `email` write access to the sheet.
    async fn share_sheet(&self, sheet_id: &str, email: &str) -> Result<(), StoreError>;

    /// Reads the current contents of `range`.
    async fn fetch_table(&self, sheet_id: &str, range: &Range) -> Result<Table, StoreError>;

    /// Paints the background of the row at 0-based `row_index`.
    async fn set_row_background(&self, sheet_id: &str, row_index: usize, color: Color) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, Default)]
struct StoredSheet {
    title: String,
    table: Table,
    backgrounds: HashMap<usize, Color>,
    shared_with: Vec<String>,
}

/// In-process [`SheetStore`]; sheets get sequential ids `sheet-1`, `sheet-2`, ...
#[derive(Debug, Default)]
pub struct MemorySheetStore {
    sheets: RwLock<HashMap<String, StoredSheet>>,
    next_id: AtomicUsize,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the table of an existing sheet, as an organizer editing it would.
    pub async fn replace_table(&self, sheet_id: &str, table: Table) -> Result<(), StoreError> {
        let mut sheets = self.sheets.write().await;
        let sheet = sheets.get_mut(sheet_id).ok_or_else(|| StoreError::SheetNotFound(sheet_id.to_owned()))?;
        sheet.table = table;
        Ok(())
    }

    pub async fn title(&self, sheet_id: &str) -> Option<String> {
        self.sheets.read().await.get(sheet_id).map(|sheet| sheet.title.to_owned())
    }

    pub async fn background(&self, sheet_id: &str, row_index: usize) -> Option<Color> {
        self.sheets.read().await.get(sheet_id).and_then(|sheet| sheet.backgrounds.get(&row_index).copied())
    }

    pub async fn shared_with(&self, sheet_id: &str) -> Vec<String> {
        self.sheets
            .read()
            .await
            .get(sheet_id)
            .map(|sheet| sheet.shared_with.clone())
            .unwrap_or_default()
    }
}

/// Keeps the rows and columns of `table` that fall inside `range`.
fn window(table: &Table, range: &Range) -> Table {
    let rows = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(row, _)| range.contains(*row, range.col_lower_bound.unwrap_or(0)))
        .map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(col, _)| range.contains(row, *col))
                .map(|(_, value)| value.clone())
                .collect()
        })
        .collect();
    Table::new(rows)
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn create_sheet(&self, title: &str, table: &Table) -> Result<SheetHandle, StoreError> {
        let sheet_id = format!("sheet-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let sheet = StoredSheet { title: title.to_owned(), table: table.clone(), ..Default::default() };
        self.sheets.write().await.insert(sheet_id.to_owned(), sheet);
        Ok(SheetHandle { sheet_id, sheet_name: title.to_owned() })
    }

    async fn share_sheet(&self, sheet_id: &str, email: &str) -> Result<(), StoreError> {
        let mut sheets = self.sheets.write().await;
        let sheet = sheets.get_mut(sheet_id).ok_or_else(|| StoreError::SheetNotFound(sheet_id.to_owned()))?;
        sheet.shared_with.push(email.to_owned());
        Ok(())
    }

    async fn fetch_table(&self, sheet_id: &str, range: &Range) -> Result<Table, StoreError> {
        let sheets = self.sheets.read().await;
        let sheet = sheets.get(sheet_id).ok_or_else(|| StoreError::SheetNotFound(sheet_id.to_owned()))?;
        Ok(window(&sheet.table, range))
    }

    async fn set_row_background(&self, sheet_id: &str, row_index: usize, color: Color) -> Result<(), StoreError> {
        let mut sheets = self.sheets.write().await;
        let sheet = sheets.get_mut(sheet_id).ok_or_else(|| StoreError::SheetNotFound(sheet_id.to_owned()))?;
        sheet.backgrounds.insert(row_index, color);
        Ok(())
    }
}
