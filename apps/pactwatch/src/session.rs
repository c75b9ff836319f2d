//! # Auth Session
//!
//! Holds "current session or none" for the external identity service and
//! publishes every change on a `tokio::sync::watch` channel.
//!
//! Pactwatch does not speak the identity protocol itself. Whatever
//! authenticated the user calls [`AuthSession::sign_in`]; everything that
//! depends on a user subscribes to the change feed.

use pactwatch_core::UserId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// An authenticated user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub access_token: String,
}

impl UserSession {
    #[must_use]
    pub fn new(user_id: UserId, email: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            access_token: access_token.into(),
        }
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for UserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSession")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish()
    }
}

/// Shared handle on the current session. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct AuthSession {
    tx: Arc<watch::Sender<Option<UserSession>>>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    /// Start signed out.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Start with an already-authenticated user.
    #[must_use]
    pub fn signed_in(session: UserSession) -> Self {
        let (tx, _rx) = watch::channel(Some(session));
        Self { tx: Arc::new(tx) }
    }

    /// The current session, if any.
    #[must_use]
    pub fn current(&self) -> Option<UserSession> {
        self.tx.borrow().clone()
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Subscribe to session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<UserSession>> {
        self.tx.subscribe()
    }

    /// Record a newly authenticated user and notify subscribers.
    pub fn sign_in(&self, session: UserSession) {
        tracing::info!(user = %session.user_id, "Session started");
        self.tx.send_replace(Some(session));
    }

    /// End the session and notify subscribers. No-op when signed out.
    pub fn sign_out(&self) {
        let previous = self.tx.send_if_modified(|current| current.take().is_some());
        if previous {
            tracing::info!("Session ended");
        }
    }
}
