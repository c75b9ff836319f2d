//! # Application Errors
//!
//! Errors surfaced by the workspace, the store adapters and the CLI.
//! Fetch and upload failures are distinct variants so callers can tell
//! them apart; neither is retried or swallowed here.

use pactwatch_core::PactError;
use thiserror::Error;

/// Errors raised by a contract store backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The backend refused our credentials.
    #[error("Unauthorized: invalid or missing credentials")]
    Unauthorized,

    /// The backend understood the request and refused it.
    #[error("{0}")]
    Rejected(String),

    /// The backend answered with something we could not parse.
    #[error("Malformed store response: {0}")]
    Malformed(String),

    /// Local I/O failed (file backend).
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors raised by the application layer.
#[derive(Debug, Error)]
pub enum AppError {
    /// No user is signed in, so the catalog is unavailable.
    #[error("No active session")]
    NoSession,

    /// The contract list could not be fetched. The catalog was not changed.
    #[error("Fetch failed: {0}")]
    FetchFailure(StoreError),

    /// The upload was rejected or failed. The catalog was not changed.
    #[error("Upload failed: {0}")]
    UploadFailure(StoreError),

    /// The file offered for upload failed local validation.
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// A core invariant was violated (bad date, duplicate id).
    #[error(transparent)]
    Core(#[from] PactError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O failed.
    #[error("I/O error: {0}")]
    Io(String),
}
