//! # Attendee Sheet Workflow
//!
//! Orchestrates the check-in flow against a [`SheetStore`]:
//!
//! - **Ingest**: `table → {accepted | NoUniqueColumn}`, then the hosted sheet is created
//!   (and shared with the configured owner).
//! - **Verification**: `Received → HashVerified → RowsMatched → {Confirmed | NotFound}`.
//!   Malformed payloads, event id mismatches and forged hashes are rejected before the
//!   live sheet is read.
//! - **Generation**: one signed QR image per data row, downloaded as a ZIP or mailed to
//!   the address found in each row.
//!
//! Every failure maps to a distinct [`WorkflowError`] so that a forged code, an absent
//! attendee and an unreachable spreadsheet service are never confused.
use crate::analyzer;
use crate::analyzer::AnalysisError;
use crate::archive::zip_files;
use crate::config::Config;
use crate::error::CheckinError;
use crate::generator::GeneratorError;
use crate::generator::QrGenerator;
use crate::mailer::DeliveryReport;
use crate::mailer::MailMessage;
use crate::mailer::Mailer;
use crate::matcher::match_rows;
use crate::matcher::MatchMode;
use crate::matcher::MatchResult;
use crate::payload::PayloadError;
use crate::payload::QrPayload;
use crate::payload::QrPayloadCodec;
use crate::signer::HashSigner;
use crate::signer::SignerError;
use crate::spreadsheet::read_workbook;
use crate::store::Color;
use crate::store::SheetHandle;
use crate::store::SheetStore;
use crate::store::StoreError;
use crate::table::Table;
use crate::table::Value;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;
use url::Url;

const SHEET_LINK_BASE: &str = "https://docs.google.com/spreadsheets/d/";

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid QR payload: {0}")]
    InvalidPayload(String),

    #[error("QR code belongs to event '{found}', not '{expected}'")]
    EventMismatch { expected: String, found: String },

    #[error("QR code hash does not match its content")]
    TamperedOrForged,

    #[error("Sheet has no column with unique values")]
    NoUniqueColumn,

    #[error("{0}")]
    MalformedTable(#[from] AnalysisError),

    #[error("Sheet contains no data")]
    EmptySheet,

    #[error("Row {row_number} is outside the sheet (1..={rows})")]
    InvalidRowNumber { row_number: usize, rows: usize },

    #[error("Sheet has no email column")]
    NoEmailColumn,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Upstream(#[from] StoreError),

    #[error("Failed to import workbook: {0}")]
    Import(#[from] CheckinError),

    #[error("QR code error: {0}")]
    Qr(String),
}

impl WorkflowError {
    /// HTTP-equivalent status for presentation layers.
    pub fn status_code(&self) -> u16 {
        match self {
            WorkflowError::InvalidPayload(_) => 400,
            WorkflowError::EventMismatch { .. } => 400,
            WorkflowError::TamperedOrForged => 403,
            WorkflowError::NoUniqueColumn => 422,
            WorkflowError::MalformedTable(_) => 422,
            WorkflowError::EmptySheet => 404,
            WorkflowError::InvalidRowNumber { .. } => 400,
            WorkflowError::NoEmailColumn => 422,
            WorkflowError::Cancelled => 499,
            WorkflowError::Upstream(_) => 502,
            WorkflowError::Import(_) => 400,
            WorkflowError::Qr(_) => 500,
        }
    }

    /// Stable user-facing message; details stay in `Display` and the logs.
    pub fn message(&self) -> &'static str {
        match self {
            WorkflowError::InvalidPayload(_) => "Invalid QR code data",
            WorkflowError::EventMismatch { .. } => "QR code does not belong to this event",
            WorkflowError::TamperedOrForged => "QR code has been tampered with or forged",
            WorkflowError::NoUniqueColumn => "No unique column found in the sheet",
            WorkflowError::MalformedTable(_) => "Sheet rows do not line up with the header",
            WorkflowError::EmptySheet => "No data found in the sheet",
            WorkflowError::InvalidRowNumber { .. } => "Invalid row number",
            WorkflowError::NoEmailColumn => "No email column found for sending emails",
            WorkflowError::Cancelled => "Request cancelled",
            WorkflowError::Upstream(_) => "Spreadsheet service unavailable",
            WorkflowError::Import(_) => "Uploaded file is not a readable workbook",
            WorkflowError::Qr(_) => "Failed to generate QR codes",
        }
    }
}

impl From<PayloadError> for WorkflowError {
    fn from(error: PayloadError) -> Self {
        match error {
            PayloadError::InvalidPayload(message) => WorkflowError::InvalidPayload(message),
            other => WorkflowError::Qr(other.to_string()),
        }
    }
}

impl From<SignerError> for WorkflowError {
    fn from(error: SignerError) -> Self {
        WorkflowError::Qr(error.to_string())
    }
}

impl From<GeneratorError> for WorkflowError {
    fn from(error: GeneratorError) -> Self {
        match error {
            GeneratorError::Cancelled => WorkflowError::Cancelled,
            GeneratorError::Payload(error) => error.into(),
            GeneratorError::Worker(message) => WorkflowError::Qr(message),
        }
    }
}

/// The event a QR code is scoped to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub sheet_id: String,
}

/// Summary shown to organizers after ingest.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventDetails {
    pub sheet_link: String,
    pub header: Vec<Value>,
    /// 1-based column numbers
    pub unique_columns: Vec<usize>,
    /// 1-based column number
    pub email_column: Option<usize>,
}

/// A successful check-in: the event and every row the code resolved to.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckIn {
    pub event_name: String,
    pub matches: Vec<MatchResult>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Verification {
    Confirmed(CheckIn),
    NotFound,
}

/// Where generated QR codes go.
pub enum Delivery<'a> {
    /// All images in one ZIP archive
    Download,
    /// Each image to the email address of its row
    SendMail(&'a dyn Mailer),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Generated {
    Archive(Vec<u8>),
    Mailed(DeliveryReport),
}

pub struct AttendeeSheetWorkflow {
    store: Arc<dyn SheetStore>,
    config: Config,
    generator: QrGenerator,
    match_mode: MatchMode,
}

impl AttendeeSheetWorkflow {
    pub fn new(store: Arc<dyn SheetStore>, config: Config) -> Result<Self, WorkflowError> {
        let signer = HashSigner::new(&config.secret_key)?;
        let codec = QrPayloadCodec::new(signer).with_module_size(config.qr_module_size);
        let generator = QrGenerator::new(codec, config.qr_concurrency);
        Ok(AttendeeSheetWorkflow { store, config, generator, match_mode: MatchMode::default() })
    }

    /// Switches verification to another matching mode.
    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn codec(&self) -> &QrPayloadCodec {
        self.generator.codec()
    }

    async fn fetch(&self, sheet_id: &str) -> Result<Table, WorkflowError> {
        Ok(self.store.fetch_table(sheet_id, &self.config.sheet_range).await?)
    }

    /// Accepts a table with at least one unique column and mirrors it into a new hosted sheet.
    pub async fn ingest(&self, title: &str, table: &Table) -> Result<SheetHandle, WorkflowError> {
        let Some(column) = analyzer::first_unique_column(table)? else {
            warn!(title, rows = table.len(), "rejected sheet without a unique column");
            return Err(WorkflowError::NoUniqueColumn);
        };
        debug!(title, column = column + 1, "found unique column");
        let handle = self.store.create_sheet(title, table).await?;
        if let Some(owner) = &self.config.owner_email {
            self.store.share_sheet(&handle.sheet_id, owner).await?;
        }
        info!(title, sheet_id = %handle.sheet_id, rows = table.len(), "ingested attendee sheet");
        Ok(handle)
    }

    /// Reads the first worksheet of an uploaded workbook and ingests it.
    pub async fn import_workbook(&self, title: &str, bytes: &[u8]) -> Result<SheetHandle, WorkflowError> {
        let table = read_workbook(bytes, Some(self.config.sheet_range))?;
        self.ingest(title, &table).await
    }

    /// Hosted link, header, unique columns and email column of a sheet.
    pub async fn event_details(&self, sheet_id: &str) -> Result<EventDetails, WorkflowError> {
        let table = self.fetch(sheet_id).await?;
        let header = table.header().ok_or(WorkflowError::EmptySheet)?.to_vec();
        let unique_columns = analyzer::find_unique_columns(&table)?.numbers();
        let email_column = analyzer::find_email_column(&table)?.map(|col| col + 1);
        Ok(EventDetails { sheet_link: sheet_link(sheet_id)?, header, unique_columns, email_column })
    }

    /// Decodes scanned QR text and verifies it against the live sheet.
    pub async fn verify_text(&self, route_event: &Event, text: &str) -> Result<Verification, WorkflowError> {
        let payload = QrPayloadCodec::decode(text).inspect_err(|e| warn!(event_id = %route_event.id, "{e}"))?;
        self.verify(route_event, &payload).await
    }

    /// Checks event scope and hash, then resolves the identifiers to live rows.
    pub async fn verify(&self, route_event: &Event, payload: &QrPayload) -> Result<Verification, WorkflowError> {
        if payload.event_id != route_event.id {
            warn!(expected = %route_event.id, found = %payload.event_id, "QR code scoped to another event");
            return Err(WorkflowError::EventMismatch {
                expected: route_event.id.to_owned(),
                found: payload.event_id.to_owned(),
            });
        }
        if !self.codec().signer().verify(&payload.event_id, &payload.data, &payload.hash)? {
            warn!(event_id = %payload.event_id, "QR code hash mismatch");
            return Err(WorkflowError::TamperedOrForged);
        }
        debug!(event_id = %payload.event_id, "QR code hash verified");

        let table = self.fetch(&route_event.sheet_id).await?;
        let matches = match_rows(&table, &payload.data, &self.match_mode);
        if matches.is_empty() {
            info!(event_id = %payload.event_id, "no attendee matches QR code");
            return Ok(Verification::NotFound);
        }
        info!(event_id = %payload.event_id, rows = ?matches.iter().map(|m| m.row_number).collect::<Vec<_>>(), "confirmed check-in");
        Ok(Verification::Confirmed(CheckIn { event_name: route_event.name.to_owned(), matches }))
    }

    /// Paints a 1-based row of the live sheet, using the configured color unless one is given.
    pub async fn highlight(&self, sheet_id: &str, row_number: usize, color: Option<Color>) -> Result<(), WorkflowError> {
        let table = self.fetch(sheet_id).await?;
        if row_number < 1 || row_number > table.len() {
            return Err(WorkflowError::InvalidRowNumber { row_number, rows: table.len() });
        }
        let color = color.unwrap_or(self.config.highlight_color);
        self.store.set_row_background(sheet_id, row_number - 1, color).await?;
        info!(sheet_id, row_number, %color, "highlighted row");
        Ok(())
    }

    /// Generates a QR code for every data row of the event sheet and delivers them.
    pub async fn generate_qr_codes(
        &self,
        event: &Event,
        delivery: Delivery<'_>,
        cancel: &CancellationToken,
    ) -> Result<Generated, WorkflowError> {
        let table = self.fetch(&event.sheet_id).await?;
        if table.is_empty() {
            return Err(WorkflowError::EmptySheet);
        }
        let columns = analyzer::find_unique_columns(&table)?;
        if columns.is_empty() {
            return Err(WorkflowError::NoUniqueColumn);
        }
        let email_column = match delivery {
            Delivery::SendMail(_) => Some(analyzer::find_email_column(&table)?.ok_or(WorkflowError::NoEmailColumn)?),
            Delivery::Download => None,
        };

        let images = self.generator.generate(&event.id, &table, &columns, cancel).await?;
        info!(event_id = %event.id, images = images.len(), columns = ?columns.numbers(), "generated QR codes");

        match (delivery, email_column) {
            (Delivery::SendMail(mailer), Some(email_column)) => {
                let mut report = DeliveryReport::default();
                for image in images {
                    if cancel.is_cancelled() {
                        return Err(WorkflowError::Cancelled);
                    }
                    let email = table.cell(image.row, email_column).canonical();
                    if !analyzer::is_valid_email(&email) {
                        report.skipped_rows.push(image.row + 1);
                        continue;
                    }
                    match mailer.send(MailMessage::qr_code(&email, &image.file_name, image.png)).await {
                        Ok(()) => report.sent.push(email),
                        Err(error) => {
                            warn!(recipient = %error.recipient, reason = %error.reason, "failed to send QR code");
                            report.failed.push((error.recipient, error.reason));
                        }
                    }
                }
                info!(sent = report.sent.len(), failed = report.failed.len(), skipped = report.skipped_rows.len(), "mailed QR codes");
                Ok(Generated::Mailed(report))
            }
            _ => {
                let archive = zip_files(images.iter().map(|image| (image.file_name.as_str(), image.png.as_slice())))
                    .map_err(|e| WorkflowError::Qr(e.to_string()))?;
                Ok(Generated::Archive(archive))
            }
        }
    }
}

/// Browser link of a hosted sheet.
pub fn sheet_link(sheet_id: &str) -> Result<String, WorkflowError> {
    // Dot segments are dropped by `push`, so they could never name a sheet
    if matches!(sheet_id, "" | "." | "..") {
        Err(StoreError::SheetNotFound(sheet_id.to_owned()))?
    }
    let mut link = Url::parse(SHEET_LINK_BASE).map_err(|e| StoreError::Upstream(e.to_string()))?;
    link.path_segments_mut()
        .map_err(|_| StoreError::Upstream(format!("{SHEET_LINK_BASE} cannot hold a sheet id")))?
        .pop_if_empty()
        .push(sheet_id);
    Ok(link.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::MailError;
    use crate::store::MemorySheetStore;
    use std::io::Cursor;
    use tokio::sync::Mutex;
    use zip::ZipArchive;

    const EVENT_ID: &str = "evt-1";

    struct RecordingMailer {
        sent: Mutex<Vec<MailMessage>>,
        reject: &'static str,
    }

    #[async_trait::async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: MailMessage) -> Result<(), MailError> {
            if message.to == self.reject {
                return Err(MailError { recipient: message.to, reason: "mailbox unavailable".to_owned() });
            }
            self.sent.lock().await.push(message);
            Ok(())
        }
    }

    fn attendees() -> Table {
        Table::from_strings(vec![
            vec!["id", "name", "email"],
            vec!["1", "Alice", "a@x.com"],
            vec!["2", "Bob", "b@x.com"],
            vec!["3", "Carol", "not an email"],
        ])
    }

    async fn setup(table: &Table) -> (Arc<MemorySheetStore>, AttendeeSheetWorkflow, Event) {
        let store = Arc::new(MemorySheetStore::new());
        let mut config = Config::new("workflow-secret").unwrap();
        config.qr_module_size = 1;
        config.owner_email = Some("owner@x.com".to_owned());
        let workflow = AttendeeSheetWorkflow::new(store.clone(), config).unwrap();
        let handle = workflow.ingest("Gala", table).await.unwrap();
        let event = Event { id: EVENT_ID.to_owned(), name: "Gala".to_owned(), sheet_id: handle.sheet_id };
        (store, workflow, event)
    }

    fn payload_for(workflow: &AttendeeSheetWorkflow, event_id: &str, data: &[&str]) -> QrPayload {
        workflow.codec().payload(event_id, data.iter().map(|v| Value::from(*v)).collect()).unwrap()
    }

    #[tokio::test]
    async fn ingest_shares_with_owner() {
        let (store, _, event) = setup(&attendees()).await;
        assert_eq!(store.shared_with(&event.sheet_id).await, vec!["owner@x.com".to_owned()]);
    }

    #[tokio::test]
    async fn ingest_rejects_sheet_without_unique_column() {
        let store = Arc::new(MemorySheetStore::new());
        let workflow = AttendeeSheetWorkflow::new(store, Config::new("k").unwrap()).unwrap();
        let table = Table::from_strings(vec![vec!["x", "x"]; 3]);
        let error = workflow.ingest("Dupes", &table).await.unwrap_err();
        assert!(matches!(error, WorkflowError::NoUniqueColumn));
        assert_eq!(error.status_code(), 422);
    }

    #[tokio::test]
    async fn event_details_report_columns_and_link() {
        let (_, workflow, event) = setup(&attendees()).await;
        let details = workflow.event_details(&event.sheet_id).await.unwrap();
        assert_eq!(details.sheet_link, format!("{SHEET_LINK_BASE}{}", event.sheet_id));
        assert_eq!(details.unique_columns, vec![1, 2, 3]);
        assert_eq!(details.email_column, Some(3));
        assert_eq!(details.header.len(), 3);
    }

    #[tokio::test]
    async fn verification_confirms_and_attaches_event_name() {
        let (_, workflow, event) = setup(&attendees()).await;
        let payload = payload_for(&workflow, EVENT_ID, &["2", "Bob", "b@x.com"]);
        let outcome = workflow.verify(&event, &payload).await.unwrap();
        let Verification::Confirmed(check_in) = outcome else { panic!("expected confirmation") };
        assert_eq!(check_in.event_name, "Gala");
        assert_eq!(check_in.matches.len(), 1);
        assert_eq!(check_in.matches[0].row_number, 3);
    }

    #[tokio::test]
    async fn verification_rejections_are_distinct() {
        let (_, workflow, event) = setup(&attendees()).await;

        let error = workflow.verify_text(&event, "{oops").await.unwrap_err();
        assert!(matches!(error, WorkflowError::InvalidPayload(_)));

        let foreign = payload_for(&workflow, "evt-2", &["1"]);
        let error = workflow.verify(&event, &foreign).await.unwrap_err();
        assert!(matches!(error, WorkflowError::EventMismatch { .. }));

        let mut forged = payload_for(&workflow, EVENT_ID, &["1", "Alice", "a@x.com"]);
        forged.data[0] = Value::from("2");
        let error = workflow.verify(&event, &forged).await.unwrap_err();
        assert!(matches!(error, WorkflowError::TamperedOrForged));
        assert_eq!(error.status_code(), 403);
    }

    #[tokio::test]
    async fn pinned_matching_ignores_values_in_other_columns() {
        let table = Table::from_strings(vec![vec!["id", "guest_of"], vec!["1", "2"], vec!["2", "1"]]);
        let (store, _, event) = setup(&table).await;
        let workflow = AttendeeSheetWorkflow::new(store, Config::new("workflow-secret").unwrap())
            .unwrap()
            .with_match_mode(MatchMode::Pinned(vec![0]));
        let payload = payload_for(&workflow, EVENT_ID, &["2"]);
        let Verification::Confirmed(check_in) = workflow.verify(&event, &payload).await.unwrap() else {
            panic!("expected confirmation")
        };
        assert_eq!(check_in.matches.iter().map(|m| m.row_number).collect::<Vec<_>>(), vec![3]);
    }

    #[tokio::test]
    async fn removed_attendee_is_not_found() {
        let (store, workflow, event) = setup(&attendees()).await;
        let payload = payload_for(&workflow, EVENT_ID, &["1", "Alice", "a@x.com"]);
        store
            .replace_table(&event.sheet_id, Table::from_strings(vec![vec!["id", "name", "email"], vec!["2", "Bob", "b@x.com"]]))
            .await
            .unwrap();
        assert_eq!(workflow.verify(&event, &payload).await.unwrap(), Verification::NotFound);
    }

    #[tokio::test]
    async fn unknown_sheet_is_an_upstream_failure() {
        let (_, workflow, mut event) = setup(&attendees()).await;
        event.sheet_id = "gone".to_owned();
        let payload = payload_for(&workflow, EVENT_ID, &["1"]);
        let error = workflow.verify(&event, &payload).await.unwrap_err();
        assert!(matches!(error, WorkflowError::Upstream(_)));
        assert_eq!(error.status_code(), 502);
    }

    #[tokio::test]
    async fn highlight_validates_row_number() {
        let (store, workflow, event) = setup(&attendees()).await;
        workflow.highlight(&event.sheet_id, 2, None).await.unwrap();
        assert_eq!(store.background(&event.sheet_id, 1).await, Some(workflow.config().highlight_color));

        for row_number in [0, 5] {
            let error = workflow.highlight(&event.sheet_id, row_number, None).await.unwrap_err();
            assert!(matches!(error, WorkflowError::InvalidRowNumber { rows: 4, .. }));
        }
    }

    #[tokio::test]
    async fn download_packs_every_data_row() {
        let (_, workflow, event) = setup(&attendees()).await;
        let generated = workflow
            .generate_qr_codes(&event, Delivery::Download, &CancellationToken::new())
            .await
            .unwrap();
        let Generated::Archive(bytes) = generated else { panic!("expected archive") };
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["qr_1.png", "qr_2.png", "qr_3.png"]);
    }

    #[tokio::test]
    async fn mail_delivery_collects_failures_and_skips() {
        let (_, workflow, event) = setup(&attendees()).await;
        let mailer = RecordingMailer { sent: Mutex::new(Vec::new()), reject: "b@x.com" };
        let generated = workflow
            .generate_qr_codes(&event, Delivery::SendMail(&mailer), &CancellationToken::new())
            .await
            .unwrap();
        let Generated::Mailed(report) = generated else { panic!("expected mail report") };
        assert_eq!(report.sent, vec!["a@x.com".to_owned()]);
        assert_eq!(report.failed, vec![("b@x.com".to_owned(), "mailbox unavailable".to_owned())]);
        assert_eq!(report.skipped_rows, vec![4]);
        assert_eq!(mailer.sent.lock().await[0].attachment_name, "qr_1.png");
    }

    #[tokio::test]
    async fn mail_delivery_requires_email_column() {
        let (_, workflow, event) = setup(&Table::from_strings(vec![vec!["id"], vec!["1"]])).await;
        let mailer = RecordingMailer { sent: Mutex::new(Vec::new()), reject: "" };
        let error = workflow
            .generate_qr_codes(&event, Delivery::SendMail(&mailer), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(error, WorkflowError::NoEmailColumn));
    }

    #[tokio::test]
    async fn cancelled_generation_returns_nothing() {
        let (_, workflow, event) = setup(&attendees()).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let error = workflow.generate_qr_codes(&event, Delivery::Download, &cancel).await.unwrap_err();
        assert!(matches!(error, WorkflowError::Cancelled));
    }

    #[test]
    fn sheet_links_are_urls() {
        assert_eq!(sheet_link("abc123").unwrap(), "https://docs.google.com/spreadsheets/d/abc123");
        assert_eq!(sheet_link("sheet-1").unwrap(), "https://docs.google.com/spreadsheets/d/sheet-1");
    }

    #[test]
    fn sheet_ids_stay_a_single_path_segment() {
        for sheet_id in ["//evil.example/x", "../../phish", "javascript:alert(1)", "a?b#c"] {
            let link = Url::parse(&sheet_link(sheet_id).unwrap()).unwrap();
            assert_eq!(link.scheme(), "https");
            assert_eq!(link.host_str(), Some("docs.google.com"));
            assert_eq!(link.query(), None);
            assert_eq!(link.fragment(), None);
            let segments: Vec<&str> = link.path_segments().unwrap().collect();
            assert_eq!(segments.len(), 3, "{sheet_id} escaped into {link}");
            assert_eq!(&segments[..2], &["spreadsheets", "d"]);
        }
        assert_eq!(
            sheet_link("//evil.example/x").unwrap(),
            "https://docs.google.com/spreadsheets/d/%2F%2Fevil.example%2Fx"
        );
        assert!(matches!(sheet_link(".."), Err(WorkflowError::Upstream(StoreError::SheetNotFound(_)))));
        assert!(matches!(sheet_link(""), Err(WorkflowError::Upstream(StoreError::SheetNotFound(_)))));
    }

    #[tokio::test]
    async fn upload_is_read_within_the_configured_window() {
        let store = Arc::new(MemorySheetStore::new());
        let workflow = AttendeeSheetWorkflow::new(store.clone(), Config::new("workflow-secret").unwrap()).unwrap();
        let bytes = crate::spreadsheet::fixtures::workbook(
            &["id", "far"],
            concat!(
                r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#,
                r#"<row r="2"><c r="A2"><v>7</v></c></row>"#,
                r#"<row r="1048576"><c r="XFD1048576" t="s"><v>1</v></c></row>"#,
            ),
        );

        let handle = workflow.import_workbook("Sparse", &bytes).await.unwrap();
        let stored = store.fetch_table(&handle.sheet_id, &workflow.config().sheet_range).await.unwrap();
        assert_eq!(stored, Table::new(vec![vec![Value::from("id")], vec![Value::Integer(7)]]));
    }
}
