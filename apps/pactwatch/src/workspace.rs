//! # Workspace
//!
//! Session-scoped application state: the contract catalog plus the
//! collaborators that feed it.
//!
//! ## Lifecycle
//!
//! - Session start ([`Workspace::on_session_change`] with a user): catalog
//!   cleared, then fetched for that user
//! - Fetch completed ([`Workspace::refresh`]): catalog replaced
//! - Upload completed ([`Workspace::upload`]): contract prepended
//! - Session end ([`Workspace::sign_out`] or a `None` change): catalog cleared
//!
//! A failed fetch or upload leaves the catalog exactly as it was.
//! Mutations are serialised by whoever owns the workspace; the server wraps
//! it in a single `RwLock`.

use crate::error::AppError;
use crate::session::{AuthSession, UserSession};
use crate::store::{ContractStore, UploadFile};
use pactwatch_core::{
    CatalogFilter, Clock, Contract, ContractCatalog, DashboardSummary, UserId,
};
use std::sync::Arc;
use tokio::sync::{RwLock, watch};

/// The catalog of one signed-in user and the services around it.
pub struct Workspace<S> {
    store: S,
    auth: AuthSession,
    clock: Arc<dyn Clock>,
    catalog: ContractCatalog,
    /// User the catalog currently belongs to.
    active_user: Option<UserId>,
}

impl<S: ContractStore> Workspace<S> {
    /// Create a workspace with an empty catalog.
    pub fn new(store: S, auth: AuthSession, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            auth,
            clock,
            catalog: ContractCatalog::new(),
            active_user: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// The catalog as last loaded or uploaded to.
    pub fn catalog(&self) -> &ContractCatalog {
        &self.catalog
    }

    /// User the catalog currently belongs to.
    pub fn active_user(&self) -> Option<&UserId> {
        self.active_user.as_ref()
    }

    fn require_session(&self) -> Result<UserSession, AppError> {
        self.auth.current().ok_or(AppError::NoSession)
    }

    fn require_user(&self) -> Result<UserId, AppError> {
        self.require_session().map(|session| session.user_id)
    }

    // =========================================================================
    // LIFECYCLE HOOKS
    // =========================================================================

    /// React to a session change.
    ///
    /// A different user gets a fresh catalog and a fetch; the same user is
    /// left alone; `None` clears everything.
    pub async fn on_session_change(
        &mut self,
        session: Option<UserSession>,
    ) -> Result<(), AppError> {
        match session {
            None => {
                if self.active_user.take().is_some() {
                    tracing::info!("Session ended, clearing catalog");
                }
                self.catalog.clear();
                Ok(())
            }
            Some(session) if self.active_user.as_ref() == Some(&session.user_id) => Ok(()),
            Some(session) => {
                tracing::info!(user = %session.user_id, "Session started, loading catalog");
                self.refresh().await.map(|_| ())
            }
        }
    }

    /// Hand the catalog to `user`, dropping whatever another user left in it.
    fn adopt_user(&mut self, user: &UserId) {
        if self.active_user.as_ref() != Some(user) {
            self.catalog.clear();
            self.active_user = Some(user.clone());
        }
    }

    /// Fetch the user's contracts and replace the catalog.
    ///
    /// Returns the number of contracts loaded. On failure the previous
    /// catalog is kept and the failure is returned, not retried.
    pub async fn refresh(&mut self) -> Result<usize, AppError> {
        let session = self.require_session()?;
        let user = session.user_id.clone();
        self.adopt_user(&user);

        let records = match self.store.fetch_all(&session).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    event = "fetch_failure",
                    user = %user,
                    error = %e,
                    "Fetching contracts failed, keeping previous catalog"
                );
                return Err(AppError::FetchFailure(e));
            }
        };

        // The session may have changed while we were waiting.
        if self.auth.current().map(|s| s.user_id).as_ref() != Some(&user) {
            return Err(AppError::NoSession);
        }

        self.catalog.load(records, self.clock.now())?;
        tracing::info!(user = %user, count = self.catalog.len(), "Catalog loaded");
        Ok(self.catalog.len())
    }

    /// Upload a document and prepend the resulting contract.
    pub async fn upload(&mut self, file: UploadFile) -> Result<Contract, AppError> {
        let session = self.require_session()?;
        let user = session.user_id.clone();
        self.adopt_user(&user);

        let record = match self.store.upload(&file, &session).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    event = "upload_failure",
                    user = %user,
                    file = file.name(),
                    error = %e,
                    "Upload failed"
                );
                return Err(AppError::UploadFailure(e));
            }
        };

        if self.auth.current().map(|s| s.user_id).as_ref() != Some(&user) {
            return Err(AppError::NoSession);
        }

        let contract = self.catalog.add(record, self.clock.now())?;
        tracing::info!(
            user = %user,
            contract = %contract.id(),
            file = file.name(),
            risk = %contract.risk_level(),
            "Uploaded contract"
        );
        Ok(contract)
    }

    /// End the session and drop the catalog.
    pub fn sign_out(&mut self) {
        self.auth.sign_out();
        self.active_user = None;
        self.catalog.clear();
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    /// The catalog, if it belongs to the signed-in user.
    ///
    /// `None` while a new user's first fetch has not landed yet.
    fn owned_catalog(&self) -> Result<Option<&ContractCatalog>, AppError> {
        let user = self.require_user()?;
        Ok((self.active_user.as_ref() == Some(&user)).then_some(&self.catalog))
    }

    /// Contracts for the list view, classified now.
    pub fn contracts(&self, filter: &CatalogFilter) -> Result<Vec<Contract>, AppError> {
        Ok(self
            .owned_catalog()?
            .map(|catalog| catalog.filter(filter, self.clock.now()))
            .unwrap_or_default())
    }

    /// Dashboard summary, classified now.
    pub fn dashboard(&self) -> Result<DashboardSummary, AppError> {
        let empty = ContractCatalog::new();
        let catalog = self.owned_catalog()?.unwrap_or(&empty);
        Ok(DashboardSummary::from_catalog(catalog, self.clock.now()))
    }

    /// The reference instant views are computed for.
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}

// =============================================================================
// SESSION FOLLOWER
// =============================================================================

/// Apply every session change to the workspace, one at a time.
///
/// Runs until every [`AuthSession`] handle is dropped. Failures are logged
/// and the loop keeps going; the catalog is left as the workspace left it.
pub async fn follow_session<S>(
    workspace: Arc<RwLock<Workspace<S>>>,
    mut changes: watch::Receiver<Option<UserSession>>,
) where
    S: ContractStore + 'static,
{
    while changes.changed().await.is_ok() {
        let session = changes.borrow_and_update().clone();
        let mut workspace = workspace.write().await;
        if let Err(e) = workspace.on_session_change(session).await {
            tracing::warn!(error = %e, "Session change could not be fully applied");
        }
    }
    tracing::debug!("Session feed closed");
}
