//! # Core Type Definitions
//!
//! This module contains the record types shared by every Pactwatch layer:
//! - Identifiers (`ContractId`, `UserId`)
//! - Enumerations (`RiskLevel`, `ContractStatus`)
//! - Store records and classified contracts (`ContractRecord`, `Contract`)
//! - Error types (`PactError`)
//!
//! ## Derived Risk
//!
//! A `ContractRecord` is what the external store hands us. It has no risk
//! field: anything a store sends under `riskLevel` is dropped on
//! deserialization. A `Contract` is a record paired with the risk tier the
//! classifier computed for it, and the tier has no setter.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque contract identifier, assigned by the external store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub String);

impl ContractId {
    /// Create a contract id from any string-like value.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Opaque identity of a signed-in user, issued by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a user id from any string-like value.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Risk tier derived from days-to-expiration.
///
/// Ordered from least to most urgent so that `High > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// All tiers, least urgent first.
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Get the display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = PactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(PactError::InvalidRecord(format!("unknown risk level '{s}'"))),
        }
    }
}

/// Lifecycle status of a contract, set by the store. Independent of risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    Active,
    Draft,
    Expired,
}

impl ContractStatus {
    /// Get the display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ContractStatus::Active => "Active",
            ContractStatus::Draft => "Draft",
            ContractStatus::Expired => "Expired",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl std::str::FromStr for ContractStatus {
    type Err = PactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(ContractStatus::Active),
            "draft" => Ok(ContractStatus::Draft),
            "expired" => Ok(ContractStatus::Expired),
            _ => Err(PactError::InvalidRecord(format!("unknown status '{s}'"))),
        }
    }
}

// =============================================================================
// EXPIRATION DATES
// =============================================================================

/// Parse an expiration date.
///
/// Accepts a plain calendar date (`2026-03-01`) or an RFC 3339 timestamp
/// (`2026-03-01T00:00:00Z`), in which case the UTC calendar date is kept.
pub fn parse_expiration(s: &str) -> Result<NaiveDate, PactError> {
    let trimmed = s.trim();
    if let Ok(date) = trimmed.parse::<NaiveDate>() {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|_| PactError::InvalidDate(s.to_string()))
}

fn deserialize_expiration<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_expiration(&raw).map_err(serde::de::Error::custom)
}

// =============================================================================
// CONTRACT RECORD
// =============================================================================

/// A contract as stored by the external contract store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub id: ContractId,
    pub name: String,
    #[serde(rename = "type")]
    pub contract_type: String,
    pub counterparty: String,
    #[serde(deserialize_with = "deserialize_expiration")]
    pub expiration_date: NaiveDate,
    pub status: ContractStatus,
}

impl ContractRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(
        id: ContractId,
        name: impl Into<String>,
        contract_type: impl Into<String>,
        counterparty: impl Into<String>,
        expiration_date: NaiveDate,
        status: ContractStatus,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            contract_type: contract_type.into(),
            counterparty: counterparty.into(),
            expiration_date,
            status,
        }
    }
}

// =============================================================================
// CONTRACT (classified)
// =============================================================================

/// A record paired with the risk tier computed for a reference instant.
///
/// Only [`Contract::classify`] can produce one, so the tier always matches
/// `classify(reference, expiration_date)` for the instant it was built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(flatten)]
    record: ContractRecord,
    risk_level: RiskLevel,
}

impl Contract {
    /// Classify a record against the given reference instant.
    #[must_use]
    pub fn classify(record: ContractRecord, reference: DateTime<Utc>) -> Self {
        let risk_level = crate::risk::classify_date(reference, record.expiration_date);
        Self { record, risk_level }
    }

    /// Re-derive the tier for a different reference instant.
    #[must_use]
    pub fn reclassified(&self, reference: DateTime<Utc>) -> Self {
        Self::classify(self.record.clone(), reference)
    }

    pub fn id(&self) -> &ContractId {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn contract_type(&self) -> &str {
        &self.record.contract_type
    }

    pub fn counterparty(&self) -> &str {
        &self.record.counterparty
    }

    pub fn expiration_date(&self) -> NaiveDate {
        self.record.expiration_date
    }

    pub fn status(&self) -> ContractStatus {
        self.record.status
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    /// Borrow the underlying store record.
    pub fn record(&self) -> &ContractRecord {
        &self.record
    }

    /// Unwrap into the store record, dropping the derived tier.
    #[must_use]
    pub fn into_record(self) -> ContractRecord {
        self.record
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the Pactwatch core.
///
/// Classification itself is total; these only come from record validation
/// and catalog key uniqueness.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PactError {
    /// An expiration date could not be parsed as a calendar date.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A contract with this id is already in the catalog.
    #[error("Duplicate contract id: {0}")]
    DuplicateContract(ContractId),

    /// A record field failed validation.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

// =============================================================================
// TESTS
// =============================================================================
