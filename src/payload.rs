//! QR payload wire format.
//!
//! A payload is the compact JSON object `{"event_id": .., "data": [..], "hash": ..}`
//! embedded as text in a QR image. Decoding accepts any valid JSON formatting.
use crate::signer::HashSigner;
use crate::signer::SignerError;
use crate::table::Value;
use image::ImageFormat;
use image::Luma;
use qrcode::QrCode;
use serde::Deserialize;
use serde::Serialize;
use std::io::Cursor;
use thiserror::Error;

pub const DEFAULT_MODULE_SIZE: u32 = 8;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("{0}")]
    Signer(#[from] SignerError),

    #[error("QR encoding failed: {0}")]
    QrEncoding(#[from] qrcode::types::QrError),

    #[error("PNG rendering failed: {0}")]
    Rendering(#[from] image::ImageError),
}

/// Structured content of a QR code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QrPayload {
    pub event_id: String,
    pub data: Vec<Value>,
    pub hash: String,
}

/// Builds signed payloads, renders them as PNG QR images and parses scanned text.
#[derive(Clone, Debug)]
pub struct QrPayloadCodec {
    signer: HashSigner,
    module_size: u32,
}

impl QrPayloadCodec {
    pub fn new(signer: HashSigner) -> Self {
        QrPayloadCodec { signer, module_size: DEFAULT_MODULE_SIZE }
    }

    /// Pixels per QR module in rendered images (minimum 1).
    pub fn with_module_size(mut self, module_size: u32) -> Self {
        self.module_size = module_size.max(1);
        self
    }

    pub fn signer(&self) -> &HashSigner {
        &self.signer
    }

    /// Signs the identifier tuple for an event.
    pub fn payload(&self, event_id: &str, data: Vec<Value>) -> Result<QrPayload, PayloadError> {
        let hash = self.signer.sign(event_id, &data)?;
        Ok(QrPayload { event_id: event_id.to_owned(), data, hash })
    }

    /// Compact JSON text carried by the QR code.
    pub fn to_json(payload: &QrPayload) -> Result<String, PayloadError> {
        serde_json::to_string(payload).map_err(|e| PayloadError::InvalidPayload(e.to_string()))
    }

    /// Renders the JSON text of `payload` as a PNG QR image.
    pub fn render(&self, payload: &QrPayload) -> Result<Vec<u8>, PayloadError> {
        let text = Self::to_json(payload)?;
        let code = QrCode::new(text.as_bytes())?;
        let image = code
            .render::<Luma<u8>>()
            .module_dimensions(self.module_size, self.module_size)
            .build();
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }

    /// Signs and renders in one step; the same inputs always embed the same hash.
    pub fn encode(&self, event_id: &str, data: Vec<Value>) -> Result<Vec<u8>, PayloadError> {
        let payload = self.payload(event_id, data)?;
        self.render(&payload)
    }

    /// Parses scanned QR text. All three fields must be present; `data` and `hash`
    /// must not be empty.
    pub fn decode(text: &str) -> Result<QrPayload, PayloadError> {
        let payload: QrPayload =
            serde_json::from_str(text.trim()).map_err(|e| PayloadError::InvalidPayload(e.to_string()))?;
        if payload.data.is_empty() {
            return Err(PayloadError::InvalidPayload("data is empty".to_owned()));
        }
        if payload.hash.trim().is_empty() {
            return Err(PayloadError::InvalidPayload("hash is empty".to_owned()));
        }
        Ok(payload)
    }
}
