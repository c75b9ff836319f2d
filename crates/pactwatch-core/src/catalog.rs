//! # Contract Catalog
//!
//! The ordered, in-memory set of one user's contracts.
//!
//! - Created empty when a session starts
//! - Replaced wholesale by [`ContractCatalog::load`] after a fetch
//! - Prepended to by [`ContractCatalog::add`] after an upload
//! - Emptied by [`ContractCatalog::clear`] when the session ends
//!
//! Ids are unique. A mutation that would break uniqueness is rejected and
//! leaves the catalog exactly as it was.

use crate::{Contract, ContractId, ContractRecord, ContractStatus, PactError, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// FILTER
// =============================================================================

/// Criteria for the contract list view. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// Only contracts in this tier.
    pub risk: Option<RiskLevel>,
    /// Only contracts with this status.
    pub status: Option<ContractStatus>,
    /// Case-insensitive substring of name, type or counterparty.
    pub search: Option<String>,
}

impl CatalogFilter {
    fn matches(&self, contract: &Contract) -> bool {
        if self.risk.is_some_and(|r| r != contract.risk_level()) {
            return false;
        }
        if self.status.is_some_and(|s| s != contract.status()) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                [
                    contract.name(),
                    contract.contract_type(),
                    contract.counterparty(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// Ordered contract collection, most recent upload first.
#[derive(Debug, Clone, Default)]
pub struct ContractCatalog {
    contracts: Vec<Contract>,
}

impl ContractCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole catalog with freshly fetched records.
    ///
    /// Order is preserved exactly. Every record is classified against
    /// `reference`; any risk the store may have held is not consulted.
    pub fn load(
        &mut self,
        records: Vec<ContractRecord>,
        reference: DateTime<Utc>,
    ) -> Result<(), PactError> {
        let mut seen = BTreeSet::new();
        for record in &records {
            if !seen.insert(&record.id) {
                return Err(PactError::DuplicateContract(record.id.clone()));
            }
        }

        self.contracts = records
            .into_iter()
            .map(|record| Contract::classify(record, reference))
            .collect();
        Ok(())
    }

    /// Insert a newly uploaded record at the front.
    ///
    /// Returns the classified contract that was inserted.
    pub fn add(
        &mut self,
        record: ContractRecord,
        reference: DateTime<Utc>,
    ) -> Result<Contract, PactError> {
        if self.contains(&record.id) {
            return Err(PactError::DuplicateContract(record.id));
        }
        let contract = Contract::classify(record, reference);
        self.contracts.insert(0, contract.clone());
        Ok(contract)
    }

    /// Remove every contract.
    pub fn clear(&mut self) {
        self.contracts.clear();
    }

    /// Contracts in catalog order, as classified when they entered.
    #[must_use]
    pub fn contracts(&self) -> &[Contract] {
        &self.contracts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Check whether a contract id is present.
    #[must_use]
    pub fn contains(&self, id: &ContractId) -> bool {
        self.contracts.iter().any(|c| c.id() == id)
    }

    /// Look up a contract by id.
    #[must_use]
    pub fn get(&self, id: &ContractId) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.id() == id)
    }

    /// Catalog order, re-classified at `reference`.
    ///
    /// Use this for display when time may have moved on since the last load.
    #[must_use]
    pub fn view(&self, reference: DateTime<Utc>) -> Vec<Contract> {
        self.contracts
            .iter()
            .map(|c| c.reclassified(reference))
            .collect()
    }

    /// Contracts matching `filter`, in catalog order, classified at `reference`.
    #[must_use]
    pub fn filter(&self, filter: &CatalogFilter, reference: DateTime<Utc>) -> Vec<Contract> {
        self.contracts
            .iter()
            .map(|c| c.reclassified(reference))
            .filter(|c| filter.matches(c))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
