//! # Sheet Check-in
//!
//! Backend core for event check-in driven by an attendee spreadsheet. Organizers upload
//! a workbook, the rows are mirrored into a hosted sheet, every attendee receives a
//! signed QR code, and a scanned code is later verified against the live sheet.
//!
//! ## Flow
//!
//! - **Upload**: `.xlsx` → [`Table`] ([`spreadsheet::read_workbook`])
//! - **Analyze**: columns with no duplicated value become attendee identifiers
//!   ([`analyzer::find_unique_columns`]); sheets without one are refused
//! - **Encode**: each data row's identifier tuple is signed with HMAC-SHA256 and rendered
//!   as a PNG QR code ([`payload::QrPayloadCodec`])
//! - **Verify**: the scanned JSON is decoded, its event scope and hash are checked, and
//!   the identifiers are matched against the current sheet ([`matcher::match_rows`])
//!
//! ## Collaborators
//!
//! The hosted spreadsheet service and mail delivery are traits ([`store::SheetStore`],
//! [`mailer::Mailer`]); [`store::MemorySheetStore`] keeps sheets in process.
//!
//! ## Configuration
//!
//! [`config::Config::from_env`] reads `SECRET_KEY` (required), `SHEET_RANGE`,
//! `QR_CONCURRENCY`, `QR_MODULE_SIZE`, `OWNER_EMAIL` and `HIGHLIGHT_COLOR`.
pub mod analyzer;
pub mod archive;
pub mod config;
pub mod error;
pub mod generator;
mod helpers;
pub mod mailer;
pub mod matcher;
pub mod payload;
pub mod signer;
pub mod spreadsheet;
pub mod store;
pub mod table;
pub mod workflow;

pub use crate::config::Config;
pub use crate::error::CheckinError;
pub use crate::payload::QrPayload;
pub use crate::payload::QrPayloadCodec;
pub use crate::signer::HashSigner;
pub use crate::table::Table;
pub use crate::table::Value;
pub use crate::workflow::AttendeeSheetWorkflow;
pub use crate::workflow::WorkflowError;

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber, filtered by `RUST_LOG` (default `info`).
/// Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}
