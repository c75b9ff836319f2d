//! # Pactwatch
//!
//! Contract portfolio server: a session-scoped catalog of contracts, each
//! tagged with an expiration risk tier, fed from a pluggable contract store.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 apps/pactwatch (THE BINARY)              │
//! │                                                          │
//! │  ┌──────────┐   ┌──────────┐   ┌──────────────────────┐  │
//! │  │   CLI    │   │ HTTP API │   │ Store adapters       │  │
//! │  │  (clap)  │   │  (axum)  │   │ memory / file / http │  │
//! │  └────┬─────┘   └────┬─────┘   └──────────┬───────────┘  │
//! │       └──────────────┼────────────────────┘              │
//! │                      ▼                                   │
//! │          Workspace + AuthSession                         │
//! │                      ▼                                   │
//! │              ┌────────────────┐                          │
//! │              │ pactwatch-core │                          │
//! │              │  (THE LOGIC)   │                          │
//! │              └────────────────┘                          │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod workspace;

pub use config::PactwatchConfig;
pub use error::{AppError, StoreError};
pub use session::{AuthSession, UserSession};
pub use store::{ContractStore, StoreBackend, UploadFile};
pub use workspace::Workspace;
