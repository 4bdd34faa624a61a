use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Why a single provider attempt produced no record.
///
/// Never escapes the resolver: every variant means "try the next provider".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid coordinates ({lat}, {lon})")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("payload has no temperature")]
    MissingTemperature,
}

impl FetchError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        FetchError::Malformed(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("messaging API returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("messaging API rejected the message: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing env: {}", .0.join(", "))]
    MissingEnv(Vec<&'static str>),

    #[error("Failed to read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("Unknown provider '{0}'. Supported providers: {1}.")]
    UnknownProvider(String, String),

    #[error("Provider '{provider}' cannot serve the {window} window")]
    WrongWindow { provider: String, window: &'static str },

    #[error("utc_offset_hours must be between -23 and 23, got {0}")]
    InvalidOffset(i32),

    #[error("Could not determine platform config directory")]
    NoConfigDir,
}

/// Shortens a response body for logs.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
