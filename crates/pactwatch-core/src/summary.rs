//! # Dashboard Summary
//!
//! Portfolio metrics extracted from a catalog for the dashboard view:
//! totals, status and risk breakdowns, and the contracts about to lapse.

use crate::risk::{HIGH_RISK_WINDOW_DAYS, days_until_date};
use crate::{ContractCatalog, ContractId, ContractStatus, RiskLevel};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Contract counts per risk tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskBreakdown {
    fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
        }
    }

    /// Count for a single tier.
    #[must_use]
    pub fn count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::High => self.high,
            RiskLevel::Medium => self.medium,
            RiskLevel::Low => self.low,
        }
    }
}

/// Contract counts per lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub active: usize,
    pub draft: usize,
    pub expired: usize,
}

impl StatusBreakdown {
    fn record(&mut self, status: ContractStatus) {
        match status {
            ContractStatus::Active => self.active += 1,
            ContractStatus::Draft => self.draft += 1,
            ContractStatus::Expired => self.expired += 1,
        }
    }
}

/// A contract inside the high-risk window that has not lapsed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringContract {
    pub id: ContractId,
    pub name: String,
    pub counterparty: String,
    pub expiration_date: NaiveDate,
    pub days_remaining: i64,
}

/// Everything the dashboard shows, computed for one reference instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// The instant the tiers were computed for.
    pub reference: DateTime<Utc>,
    pub total: usize,
    pub by_status: StatusBreakdown,
    pub by_risk: RiskBreakdown,
    /// Soonest first; ties broken by name.
    pub expiring_soon: Vec<ExpiringContract>,
}

impl DashboardSummary {
    /// Summarise a catalog at `reference`.
    #[must_use]
    pub fn from_catalog(catalog: &ContractCatalog, reference: DateTime<Utc>) -> Self {
        let mut by_status = StatusBreakdown::default();
        let mut by_risk = RiskBreakdown::default();
        let mut expiring_soon = Vec::new();

        for contract in catalog.view(reference) {
            by_status.record(contract.status());
            by_risk.record(contract.risk_level());

            let days_remaining = days_until_date(reference, contract.expiration_date());
            if (0..HIGH_RISK_WINDOW_DAYS).contains(&days_remaining) {
                expiring_soon.push(ExpiringContract {
                    id: contract.id().clone(),
                    name: contract.name().to_string(),
                    counterparty: contract.counterparty().to_string(),
                    expiration_date: contract.expiration_date(),
                    days_remaining,
                });
            }
        }

        expiring_soon.sort_by(|a, b| {
            a.days_remaining
                .cmp(&b.days_remaining)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self {
            reference,
            total: catalog.len(),
            by_status,
            by_risk,
            expiring_soon,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
