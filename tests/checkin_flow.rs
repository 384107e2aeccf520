use pretty_assertions::assert_eq;
use sheet_checkin::analyzer::find_unique_columns;
use sheet_checkin::matcher::match_rows;
use sheet_checkin::matcher::MatchMode;
use sheet_checkin::store::MemorySheetStore;
use sheet_checkin::store::SheetStore;
use sheet_checkin::workflow::Event;
use sheet_checkin::workflow::Verification;
use sheet_checkin::AttendeeSheetWorkflow;
use sheet_checkin::Config;
use sheet_checkin::QrPayloadCodec;
use sheet_checkin::Table;
use sheet_checkin::Value;
use sheet_checkin::WorkflowError;
use std::io::Cursor;
use std::io::Write;
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn workflow(store: Arc<MemorySheetStore>) -> AttendeeSheetWorkflow {
    AttendeeSheetWorkflow::new(store, Config::new("integration-secret").unwrap()).unwrap()
}

fn values(items: &[&str]) -> Vec<Value> {
    items.iter().map(|item| Value::from(*item)).collect()
}

#[tokio::test]
async fn ingest_generate_scan_round_trip() {
    let store = Arc::new(MemorySheetStore::new());
    let workflow = workflow(store.clone());
    let table = Table::from_strings(vec![vec!["id", "email"], vec!["1", "a@x.com"], vec!["2", "b@x.com"]]);

    let columns = find_unique_columns(&table).unwrap();
    assert_eq!(columns.numbers(), vec![1, 2]);

    let handle = workflow.ingest("Launch", &table).await.unwrap();
    let event = Event { id: "launch-2025".to_owned(), name: "Launch".to_owned(), sheet_id: handle.sheet_id };

    let identifiers = columns.project(&table, 1);
    assert_eq!(identifiers, values(&["1", "a@x.com"]));
    let payload = workflow.codec().payload(&event.id, identifiers).unwrap();
    let scanned = QrPayloadCodec::to_json(&payload).unwrap();

    let Verification::Confirmed(check_in) = workflow.verify_text(&event, &scanned).await.unwrap() else {
        panic!("expected a confirmed check-in");
    };
    assert_eq!(check_in.event_name, "Launch");
    assert_eq!(check_in.matches.len(), 1);
    assert_eq!(check_in.matches[0].row_number, 2);
    assert_eq!(check_in.matches[0].row_data, values(&["1", "a@x.com"]));
}

#[tokio::test]
async fn identical_rows_are_rejected_at_ingest() {
    let store = Arc::new(MemorySheetStore::new());
    let workflow = workflow(store.clone());
    let table = Table::from_strings(vec![vec!["x", "x"], vec!["x", "x"], vec!["x", "x"]]);

    let error = workflow.ingest("Copies", &table).await.unwrap_err();
    assert!(matches!(error, WorkflowError::NoUniqueColumn));
    assert_eq!(error.message(), "No unique column found in the sheet");
    assert!(store.title("sheet-1").await.is_none());
}

#[tokio::test]
async fn short_row_checks_in_with_its_empty_note() {
    let store = Arc::new(MemorySheetStore::new());
    let workflow = workflow(store.clone());
    let table = Table::new(vec![values(&["id", "note"]), values(&["1", "vip"]), values(&["2"])]);
    let handle = workflow.ingest("Ragged", &table).await.unwrap();
    let event = Event { id: "ragged".to_owned(), name: "Ragged".to_owned(), sheet_id: handle.sheet_id };

    let columns = find_unique_columns(&table).unwrap();
    let identifiers = columns.project(&table, 2);
    assert_eq!(identifiers, vec![Value::from("2"), Value::Empty]);
    let scanned = QrPayloadCodec::to_json(&workflow.codec().payload("ragged", identifiers).unwrap()).unwrap();

    let Verification::Confirmed(check_in) = workflow.verify_text(&event, &scanned).await.unwrap() else {
        panic!("expected a confirmed check-in");
    };
    assert_eq!(check_in.matches[0].row_number, 3);
}

#[test]
fn matcher_reference_examples() {
    let table = Table::from_strings(vec![vec!["Alice", "a@x.com"], vec!["Bob", "b@x.com"]]);

    let matches = match_rows(&table, &values(&["a@x.com"]), &MatchMode::Anywhere);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].row_number, 1);

    assert!(match_rows(&table, &values(&["zzz"]), &MatchMode::Anywhere).is_empty());
}

#[tokio::test]
async fn edited_sheet_is_read_live() {
    let store = Arc::new(MemorySheetStore::new());
    let workflow = workflow(store.clone());
    let table = Table::from_strings(vec![vec!["ticket"], vec!["T-1"], vec!["T-2"]]);
    let handle = workflow.ingest("Live", &table).await.unwrap();
    let event = Event { id: "live".to_owned(), name: "Live".to_owned(), sheet_id: handle.sheet_id.to_owned() };
    let payload = workflow.codec().payload("live", values(&["t-2"])).unwrap();

    assert!(matches!(workflow.verify(&event, &payload).await.unwrap(), Verification::Confirmed(_)));

    store
        .replace_table(&handle.sheet_id, Table::from_strings(vec![vec!["ticket"], vec!["T-1"]]))
        .await
        .unwrap();
    assert_eq!(workflow.verify(&event, &payload).await.unwrap(), Verification::NotFound);
}

#[tokio::test]
async fn payload_from_another_secret_is_forged() {
    let store = Arc::new(MemorySheetStore::new());
    let workflow = workflow(store.clone());
    let table = Table::from_strings(vec![vec!["id"], vec!["1"]]);
    let handle = workflow.ingest("Keys", &table).await.unwrap();
    let event = Event { id: "keys".to_owned(), name: "Keys".to_owned(), sheet_id: handle.sheet_id };

    let impostor = AttendeeSheetWorkflow::new(store.clone(), Config::new("other-secret").unwrap()).unwrap();
    let payload = impostor.codec().payload("keys", values(&["1"])).unwrap();
    let error = workflow.verify(&event, &payload).await.unwrap_err();
    assert!(matches!(error, WorkflowError::TamperedOrForged));
}

fn workbook_bytes() -> Vec<u8> {
    let parts = [
        (
            "xl/_rels/workbook.xml.rels",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#,
        ),
        (
            "xl/workbook.xml",
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Guests" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        ),
        (
            "xl/worksheets/sheet1.xml",
            concat!(
                r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
                r#"<row r="1"><c r="A1" t="inlineStr"><is><t>seat</t></is></c><c r="B1" t="inlineStr"><is><t>email</t></is></c></row>"#,
                r#"<row r="2"><c r="A2"><v>12</v></c><c r="B2" t="inlineStr"><is><t>a@x.com</t></is></c></row>"#,
                r#"<row r="3"><c r="A3"><v>14</v></c><c r="B3" t="inlineStr"><is><t>b@x.com</t></is></c></row>"#,
                r#"</sheetData></worksheet>"#,
            ),
        ),
    ];
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn uploaded_workbook_checks_in_by_numeric_seat() {
    let store = Arc::new(MemorySheetStore::new());
    let workflow = workflow(store.clone());
    let handle = workflow.import_workbook("Guests", &workbook_bytes()).await.unwrap();

    let stored = store.fetch_table(&handle.sheet_id, &workflow.config().sheet_range).await.unwrap();
    assert_eq!(stored.cell(1, 0), &Value::Integer(12));

    let details = workflow.event_details(&handle.sheet_id).await.unwrap();
    assert_eq!(details.unique_columns, vec![1, 2]);
    assert_eq!(details.email_column, Some(2));

    let event = Event { id: "guests".to_owned(), name: "Guests".to_owned(), sheet_id: handle.sheet_id };
    let columns = find_unique_columns(&stored).unwrap();
    let payload = workflow.codec().payload("guests", columns.project(&stored, 2)).unwrap();
    let text = QrPayloadCodec::to_json(&payload).unwrap();
    assert!(text.contains(r#""data":[14,"b@x.com"]"#));

    let Verification::Confirmed(check_in) = workflow.verify_text(&event, &text).await.unwrap() else {
        panic!("expected a confirmed check-in");
    };
    assert_eq!(check_in.matches[0].row_number, 3);
}

#[tokio::test]
async fn garbage_upload_is_an_import_error() {
    let workflow = workflow(Arc::new(MemorySheetStore::new()));
    let error = workflow.import_workbook("Bad", b"not a workbook").await.unwrap_err();
    assert!(matches!(error, WorkflowError::Import(_)));
    assert_eq!(error.status_code(), 400);
}
