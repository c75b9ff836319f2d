//! In-process contract store.

use super::{ContractStore, UploadFile, derive_contract_id, draft_record};
use crate::error::StoreError;
use crate::session::UserSession;
use pactwatch_core::{Clock, ContractRecord, SystemClock, UserId};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Contracts held in memory per user, newest first.
pub struct MemoryContractStore {
    contracts: Mutex<BTreeMap<UserId, Vec<ContractRecord>>>,
    uploads: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for MemoryContractStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryContractStore")
            .field("uploads", &self.uploads.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MemoryContractStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContractStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Use `clock` to date new drafts.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            contracts: Mutex::new(BTreeMap::new()),
            uploads: AtomicU64::new(0),
            clock,
        }
    }

    /// Seed a user's contracts, replacing any already held.
    pub fn seed(&self, user: &UserId, records: Vec<ContractRecord>) {
        let mut contracts = self.contracts.lock().unwrap_or_else(|e| e.into_inner());
        contracts.insert(user.clone(), records);
    }
}

impl ContractStore for MemoryContractStore {
    async fn fetch_all(&self, session: &UserSession) -> Result<Vec<ContractRecord>, StoreError> {
        let contracts = self.contracts.lock().unwrap_or_else(|e| e.into_inner());
        Ok(contracts.get(&session.user_id).cloned().unwrap_or_default())
    }

    async fn upload(
        &self,
        file: &UploadFile,
        session: &UserSession,
    ) -> Result<ContractRecord, StoreError> {
        let user = &session.user_id;
        let sequence = self.uploads.fetch_add(1, Ordering::Relaxed);
        let id = derive_contract_id(user, file, u128::from(sequence));
        let record = draft_record(id, file, self.clock.now().date_naive());

        let mut contracts = self.contracts.lock().unwrap_or_else(|e| e.into_inner());
        contracts
            .entry(user.clone())
            .or_default()
            .insert(0, record.clone());
        Ok(record)
    }
}
