//! Offline check-in tool: runs the workflow against an in-memory sheet loaded from an `.xlsx` file.
use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use sheet_checkin::store::MemorySheetStore;
use sheet_checkin::workflow::Delivery;
use sheet_checkin::workflow::Event;
use sheet_checkin::workflow::Generated;
use sheet_checkin::workflow::Verification;
use sheet_checkin::AttendeeSheetWorkflow;
use sheet_checkin::Config;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "checkin", about = "Attendee sheet analysis, QR generation and QR verification")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report unique columns and the email column of a workbook.
    Analyze {
        /// Attendee workbook (.xlsx)
        workbook: PathBuf,
    },
    /// Write one QR code per attendee into a ZIP archive.
    Generate {
        workbook: PathBuf,
        /// Event id embedded in every QR code
        #[arg(long)]
        event: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Verify a scanned QR payload against a workbook.
    Verify {
        workbook: PathBuf,
        #[arg(long)]
        event: String,
        /// Event name shown on confirmation
        #[arg(long, default_value = "Event")]
        name: String,
        /// Payload JSON, or @path to read it from a file
        #[arg(long)]
        payload: String,
    },
}

/// Loads the workbook into a fresh in-memory store and returns the workflow and event.
async fn load(path: &Path, event_id: &str, event_name: &str) -> Result<(AttendeeSheetWorkflow, Event)> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let workflow = AttendeeSheetWorkflow::new(Arc::new(MemorySheetStore::new()), config)?;
    let title = path.file_stem().map(|stem| stem.to_string_lossy().to_string()).unwrap_or_default();
    let handle = workflow
        .import_workbook(&title, &bytes)
        .await
        .with_context(|| format!("Failed to import {}", path.display()))?;
    let event = Event { id: event_id.to_owned(), name: event_name.to_owned(), sheet_id: handle.sheet_id };
    Ok((workflow, event))
}

fn read_payload(argument: &str) -> Result<String> {
    match argument.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read payload file {path}")),
        None => Ok(argument.to_owned()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    sheet_checkin::init_tracing();
    let args = Args::parse();

    match args.command {
        Command::Analyze { workbook } => {
            let (workflow, event) = load(&workbook, "", "").await?;
            let details = workflow.event_details(&event.sheet_id).await?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
        Command::Generate { workbook, event, out } => {
            let (workflow, event) = load(&workbook, &event, "").await?;
            let cancel = CancellationToken::new();
            let watcher = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    watcher.cancel();
                }
            });
            match workflow.generate_qr_codes(&event, Delivery::Download, &cancel).await? {
                Generated::Archive(bytes) => {
                    fs::write(&out, bytes).with_context(|| format!("Failed to write {}", out.display()))?;
                    info!(out = %out.display(), "wrote QR archive");
                }
                Generated::Mailed(_) => bail!("unexpected mail delivery"),
            }
        }
        Command::Verify { workbook, event, name, payload } => {
            let (workflow, event) = load(&workbook, &event, &name).await?;
            let text = read_payload(&payload)?;
            match workflow.verify_text(&event, &text).await {
                Ok(Verification::Confirmed(check_in)) => println!("{}", serde_json::to_string_pretty(&check_in)?),
                Ok(Verification::NotFound) => bail!("No matching attendee found"),
                Err(error) => bail!("{} ({}): {}", error.message(), error.status_code(), error),
            }
        }
    }
    Ok(())
}
