// error.rs
use thiserror::Error;

use crate::models::DeviceKind;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Remote returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid base url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    #[error("Intent {intent} is not supported by a {kind} device")]
    UnsupportedIntent { kind: DeviceKind, intent: &'static str },
    #[error("Invalid intent: {0}")]
    InvalidIntent(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Code reported back to dashboard clients.
    pub fn code(&self) -> u16 {
        match self {
            SyncError::DeviceNotFound(_) => 404,
            SyncError::UnsupportedIntent { .. } | SyncError::InvalidIntent(_) => 400,
            _ => 500,
        }
    }
}
