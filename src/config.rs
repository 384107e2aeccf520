//! Process configuration, loaded from the environment.
use crate::spreadsheet::range::Range;
use crate::store::Color;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_SHEET_RANGE: &str = "A1:Z1000";
pub const DEFAULT_QR_CONCURRENCY: usize = 4;
pub const DEFAULT_QR_MODULE_SIZE: u32 = crate::payload::DEFAULT_MODULE_SIZE;
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#B7E1CD";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("SECRET_KEY is not set; refusing to sign QR codes without a secret")]
    MissingSecret,

    #[error("Invalid {key} value: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub secret_key: String,
    /// Window read from hosted sheets
    pub sheet_range: Range,
    /// Upper bound on QR images rendered at once
    pub qr_concurrency: usize,
    pub qr_module_size: u32,
    /// New sheets are shared with this address when set
    pub owner_email: Option<String>,
    pub highlight_color: Color,
}

impl Config {
    /// Configuration with defaults and the given secret.
    pub fn new(secret_key: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| (key == "SECRET_KEY").then(|| secret_key.to_owned()))
    }

    /// Reads `SECRET_KEY`, `SHEET_RANGE`, `QR_CONCURRENCY`, `QR_MODULE_SIZE`,
    /// `OWNER_EMAIL` and `HIGHLIGHT_COLOR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("SECRET_KEY")
            .map(|secret| secret.trim().to_owned())
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::MissingSecret)?;

        let range_text = load_text(&lookup, "SHEET_RANGE", DEFAULT_SHEET_RANGE);
        let sheet_range = Range::try_from(range_text.as_str()).map_err(|e| invalid("SHEET_RANGE", e))?;

        let qr_concurrency: usize = try_load(&lookup, "QR_CONCURRENCY", DEFAULT_QR_CONCURRENCY)?;
        if qr_concurrency == 0 {
            return Err(invalid("QR_CONCURRENCY", "must be at least 1"));
        }
        let qr_module_size: u32 = try_load(&lookup, "QR_MODULE_SIZE", DEFAULT_QR_MODULE_SIZE)?;

        let owner_email = lookup("OWNER_EMAIL")
            .map(|email| email.trim().to_owned())
            .filter(|email| !email.is_empty());

        let color_text = load_text(&lookup, "HIGHLIGHT_COLOR", DEFAULT_HIGHLIGHT_COLOR);
        let highlight_color = Color::from_hex(&color_text).map_err(|e| invalid("HIGHLIGHT_COLOR", e))?;

        Ok(Config { secret_key, sheet_range, qr_concurrency, qr_module_size, owner_email, highlight_color })
    }
}

fn invalid(key: &str, message: impl Display) -> ConfigError {
    ConfigError::InvalidValue { key: key.to_owned(), message: message.to_string() }
}

fn load_text<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_owned()
    })
}

fn try_load<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e| invalid(key, e)),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
