//! Error types for the Aranya application
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the frontend.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Bad credentials, identity provider failure or missing configuration
    #[error("{0}")]
    Auth(String),

    /// A signed-in user attempted an action their role does not allow
    #[error("{0}")]
    Unauthorized(String),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service answered with an error
    #[error("{service} error ({status}): {message}")]
    Remote {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// A document or upload response that cannot be interpreted
    #[error("{0}")]
    DataIntegrity(String),

    /// A staged file the media host did not accept; holds its locator
    #[error("File upload failed for '{0}'. Please try again.")]
    Upload(String),

    /// Device location could not be obtained
    #[error("{0}")]
    Location(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A required input failed local validation
    #[error("{0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Credential store error: {0}")]
    Credential(#[from] keyring::Error),

    #[cfg(feature = "desktop")]
    #[error("Tauri error: {0}")]
    Tauri(#[from] tauri::Error),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
