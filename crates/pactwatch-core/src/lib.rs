//! # pactwatch-core
//!
//! Contract risk classification and the session-scoped contract catalog -
//! THE LOGIC.
//!
//! ## Architectural Constraints
//!
//! - Pure: no async, no network, no I/O
//! - Clock-free: every reference instant is an explicit argument
//! - Integer day arithmetic only
//! - Risk tiers are derived, never stored or accepted from outside

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod clock;
pub mod risk;
pub mod summary;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Contract, ContractId, ContractRecord, ContractStatus, PactError, RiskLevel, UserId,
    parse_expiration,
};

// =============================================================================
// RE-EXPORTS: Classification & Catalog
// =============================================================================

pub use catalog::{CatalogFilter, ContractCatalog};
pub use clock::{Clock, FixedClock, SystemClock};
pub use risk::{
    HIGH_RISK_WINDOW_DAYS, MEDIUM_RISK_WINDOW_DAYS, classify, classify_date, days_until,
    days_until_date, start_of_day, tier_for_days,
};
pub use summary::{DashboardSummary, ExpiringContract, RiskBreakdown, StatusBreakdown};
