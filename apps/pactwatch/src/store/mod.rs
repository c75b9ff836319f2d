//! # Contract Store Module
//!
//! The external persistence the catalog is fed from.
//!
//! ## Backends
//!
//! - `Memory`: in-process map (tests, demo mode)
//! - `File`: one JSON catalog per user under a root directory
//! - `Http`: a hosted backend reached over REST
//!
//! Every call is fallible. Callers decide what a failure means for the
//! catalog; the store never touches it.

mod file;
mod http;
mod memory;

pub use file::FileContractStore;
pub use http::{HttpContractStore, UploadBody};
pub use memory::MemoryContractStore;

use crate::config::{StoreConfig, StoreKind};
use crate::error::{AppError, StoreError};
use crate::session::UserSession;
use chrono::{Days, NaiveDate};
use pactwatch_core::{Clock, ContractId, ContractRecord, ContractStatus, UserId};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum size of a single uploaded document (25 MiB).
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Maximum length of an uploaded file name.
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// Days until a freshly uploaded draft expires.
const DRAFT_TERM_DAYS: u64 = 365;

/// Counterparty recorded on drafts until someone fills it in.
const UNASSIGNED_COUNTERPARTY: &str = "Unassigned";

// =============================================================================
// UPLOAD FILE
// =============================================================================

/// A document offered for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    name: String,
    bytes: Vec<u8>,
}

impl UploadFile {
    /// Validate and wrap a document.
    ///
    /// The name is reduced to its final path component.
    pub fn new(name: impl AsRef<str>, bytes: Vec<u8>) -> Result<Self, AppError> {
        let name = Path::new(name.as_ref())
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        if name.is_empty() {
            return Err(AppError::InvalidUpload("file name is empty".to_string()));
        }
        if name.len() > MAX_FILE_NAME_LENGTH {
            return Err(AppError::InvalidUpload(format!(
                "file name length {} exceeds maximum {}",
                name.len(),
                MAX_FILE_NAME_LENGTH
            )));
        }
        if bytes.is_empty() {
            return Err(AppError::InvalidUpload(format!("'{name}' is empty")));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::InvalidUpload(format!(
                "'{}' is {} bytes, maximum is {}",
                name,
                bytes.len(),
                MAX_UPLOAD_BYTES
            )));
        }

        Ok(Self { name, bytes })
    }

    /// Read a document from disk.
    pub async fn from_path(path: &Path) -> Result<Self, AppError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| AppError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
        if !metadata.is_file() {
            return Err(AppError::InvalidUpload(format!(
                "'{}' is not a regular file",
                path.display()
            )));
        }
        if metadata.len() > MAX_UPLOAD_BYTES as u64 {
            return Err(AppError::InvalidUpload(format!(
                "'{}' is {} bytes, maximum is {}",
                path.display(),
                metadata.len(),
                MAX_UPLOAD_BYTES
            )));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
        Self::new(path.to_string_lossy(), bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }

    /// Document type guessed from the extension.
    pub fn document_type(&self) -> String {
        match Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("pdf") => "PDF".to_string(),
            Some("doc" | "docx") => "Word".to_string(),
            Some("txt" | "md") => "Text".to_string(),
            Some(other) if !other.is_empty() => other.to_ascii_uppercase(),
            _ => "Document".to_string(),
        }
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// External contract persistence.
///
/// Calls are made on behalf of a signed-in user. Backends that enforce
/// access themselves authenticate with the session's token.
pub trait ContractStore: Send + Sync {
    /// Every contract the user owns, in the store's display order.
    fn fetch_all(
        &self,
        session: &UserSession,
    ) -> impl Future<Output = Result<Vec<ContractRecord>, StoreError>> + Send;

    /// Store a document and return the record created for it.
    fn upload(
        &self,
        file: &UploadFile,
        session: &UserSession,
    ) -> impl Future<Output = Result<ContractRecord, StoreError>> + Send;
}

// =============================================================================
// LOCAL RECORD HELPERS
// =============================================================================

/// Derive a contract id from the upload and a caller-chosen salt.
fn derive_contract_id(user: &UserId, file: &UploadFile, salt: u128) -> ContractId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(user.as_str().as_bytes());
    hasher.update(&[0]);
    hasher.update(file.name().as_bytes());
    hasher.update(&[0]);
    hasher.update(file.bytes());
    hasher.update(&salt.to_le_bytes());
    let hex = hasher.finalize().to_hex();
    ContractId::new(format!("ct_{}", &hex.as_str()[..16]))
}

/// The record a local backend creates for a new upload: a draft named after
/// the file, expiring one term after `today`.
fn draft_record(id: ContractId, file: &UploadFile, today: NaiveDate) -> ContractRecord {
    let expiration = today
        .checked_add_days(Days::new(DRAFT_TERM_DAYS))
        .unwrap_or(NaiveDate::MAX);
    ContractRecord::new(
        id,
        file.stem(),
        file.document_type(),
        UNASSIGNED_COUNTERPARTY,
        expiration,
        ContractStatus::Draft,
    )
}

// =============================================================================
// BACKEND SWITCH
// =============================================================================

/// The configured store backend.
#[derive(Debug)]
pub enum StoreBackend {
    Memory(MemoryContractStore),
    File(FileContractStore),
    Http(HttpContractStore),
}

impl StoreBackend {
    /// Build the backend described by the configuration. Local backends
    /// date new drafts with `clock`.
    pub fn from_config(config: &StoreConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        match config.backend {
            StoreKind::Memory => Ok(Self::Memory(MemoryContractStore::with_clock(clock))),
            StoreKind::File => Ok(Self::File(FileContractStore::with_clock(&config.path, clock))),
            StoreKind::Http => {
                let url = config.url.clone().ok_or_else(|| {
                    AppError::Config("store.url is required for the http backend".to_string())
                })?;
                Ok(Self::Http(HttpContractStore::new(url, config.api_key.clone())))
            }
        }
    }

    /// Backend name for logs and status output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::File(_) => "file",
            Self::Http(_) => "http",
        }
    }
}

impl ContractStore for StoreBackend {
    async fn fetch_all(&self, session: &UserSession) -> Result<Vec<ContractRecord>, StoreError> {
        match self {
            Self::Memory(store) => store.fetch_all(session).await,
            Self::File(store) => store.fetch_all(session).await,
            Self::Http(store) => store.fetch_all(session).await,
        }
    }

    async fn upload(
        &self,
        file: &UploadFile,
        session: &UserSession,
    ) -> Result<ContractRecord, StoreError> {
        match self {
            Self::Memory(store) => store.upload(file, session).await,
            Self::File(store) => store.upload(file, session).await,
            Self::Http(store) => store.upload(file, session).await,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
