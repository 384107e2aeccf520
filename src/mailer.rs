//! Mail delivery collaborator for per-attendee QR codes.
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub const QR_MAIL_SUBJECT: &str = "Your Event QR Code";
pub const QR_MAIL_BODY: &str = "Please find your QR code attached.";

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Mail delivery to '{recipient}' failed: {reason}")]
pub struct MailError {
    pub recipient: String,
    pub reason: String,
}

/// One outgoing message with a single attachment.
#[derive(Clone, Debug, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

impl MailMessage {
    /// The standard message carrying one attendee's QR image.
    pub fn qr_code(to: &str, file_name: &str, png: Vec<u8>) -> Self {
        MailMessage {
            to: to.to_owned(),
            subject: QR_MAIL_SUBJECT.to_owned(),
            body: QR_MAIL_BODY.to_owned(),
            attachment_name: file_name.to_owned(),
            attachment: png,
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Outcome of a mail run. Failures never abort the run; they are collected here.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DeliveryReport {
    /// Recipients that accepted their message
    pub sent: Vec<String>,
    /// 1-based row numbers skipped because their email cell is not a valid address
    pub skipped_rows: Vec<usize>,
    /// (recipient, reason) pairs for rejected deliveries
    pub failed: Vec<(String, String)>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.skipped_rows.is_empty() && self.failed.is_empty()
    }
}
