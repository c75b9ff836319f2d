//! # File Contract Store
//!
//! One directory per user under a root:
//!
//! ```text
//! <root>/<user_id>/contracts.json        catalog, newest first
//! <root>/<user_id>/files/<id>/<name>     uploaded documents
//! ```

use super::{ContractStore, UploadFile, derive_contract_id, draft_record};
use crate::error::StoreError;
use crate::session::UserSession;
use pactwatch_core::{Clock, ContractRecord, SystemClock, UserId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

const CATALOG_FILE: &str = "contracts.json";
const FILES_DIR: &str = "files";

/// Contracts persisted as JSON on the local filesystem.
pub struct FileContractStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
    /// Serialises read-modify-write cycles on the catalog files.
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for FileContractStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileContractStore")
            .field("root", &self.root)
            .finish()
    }
}

impl FileContractStore {
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_clock(root, Arc::new(SystemClock))
    }

    /// Use `clock` to date new drafts and salt ids.
    #[must_use]
    pub fn with_clock(root: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            clock,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one user. User ids never escape the root.
    fn user_dir(&self, user: &UserId) -> Result<PathBuf, StoreError> {
        let id = user.as_str();
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
            && id != "."
            && id != "..";
        if !safe {
            return Err(StoreError::Rejected(format!("invalid user id '{id}'")));
        }
        Ok(self.root.join(id))
    }

    async fn read_catalog(&self, dir: &Path) -> Result<Vec<ContractRecord>, StoreError> {
        let path = dir.join(CATALOG_FILE);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "Cannot read '{}': {}",
                    path.display(),
                    e
                )));
            }
        };
        serde_json::from_slice(&data)
            .map_err(|e| StoreError::Malformed(format!("{}: {}", path.display(), e)))
    }

    async fn write_catalog(&self, dir: &Path, records: &[ContractRecord]) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::Malformed(format!("Cannot encode catalog: {e}")))?;
        let path = dir.join(CATALOG_FILE);
        let staging = dir.join(format!("{CATALOG_FILE}.tmp"));
        tokio::fs::write(&staging, data)
            .await
            .map_err(|e| StoreError::Io(format!("Cannot write '{}': {}", staging.display(), e)))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| StoreError::Io(format!("Cannot replace '{}': {}", path.display(), e)))
    }
}

impl ContractStore for FileContractStore {
    async fn fetch_all(&self, session: &UserSession) -> Result<Vec<ContractRecord>, StoreError> {
        let dir = self.user_dir(&session.user_id)?;
        self.read_catalog(&dir).await
    }

    async fn upload(
        &self,
        file: &UploadFile,
        session: &UserSession,
    ) -> Result<ContractRecord, StoreError> {
        let user = &session.user_id;
        let dir = self.user_dir(user)?;
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_catalog(&dir).await?;
        let now = self.clock.now();
        let salt = ((now.timestamp_micros() as u128) << 32) | records.len() as u128;
        let id = derive_contract_id(user, file, salt);
        if records.iter().any(|r| r.id == id) {
            return Err(StoreError::Rejected(format!("contract {id} already exists")));
        }

        let file_dir = dir.join(FILES_DIR).join(id.as_str());
        tokio::fs::create_dir_all(&file_dir)
            .await
            .map_err(|e| StoreError::Io(format!("Cannot create '{}': {}", file_dir.display(), e)))?;
        let document = file_dir.join(file.name());
        tokio::fs::write(&document, file.bytes())
            .await
            .map_err(|e| StoreError::Io(format!("Cannot write '{}': {}", document.display(), e)))?;

        let record = draft_record(id, file, now.date_naive());
        records.insert(0, record.clone());
        self.write_catalog(&dir, &records).await?;

        tracing::debug!(
            user = %user,
            contract = %record.id,
            path = %document.display(),
            "Stored uploaded document"
        );
        Ok(record)
    }
}
