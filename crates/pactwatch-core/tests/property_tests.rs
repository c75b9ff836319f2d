//! # Property-Based Tests
//!
//! Classification and catalog invariants checked with proptest.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use pactwatch_core::{
    ContractCatalog, ContractId, ContractRecord, ContractStatus, RiskLevel, classify,
    classify_date,
};
use proptest::collection::vec;
use proptest::prelude::*;

/// Seconds range covering 1970..2100.
const MAX_SECS: i64 = 4_102_444_800;

fn instant(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("in range")
}

fn record(id: usize, expires: NaiveDate) -> ContractRecord {
    ContractRecord::new(
        ContractId::new(format!("c-{id}")),
        format!("Contract {id}"),
        "Service Agreement",
        "Acme Corp",
        expires,
        ContractStatus::Active,
    )
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Classification is total and deterministic.
    #[test]
    fn classify_is_total_and_deterministic(r in 0i64..MAX_SECS, e in 0i64..MAX_SECS) {
        let level = classify(instant(r), instant(e));
        prop_assert!(RiskLevel::ALL.contains(&level));
        prop_assert_eq!(level, classify(instant(r), instant(e)));
    }

    /// Whole-day offsets hit the documented tiers exactly.
    #[test]
    fn whole_day_boundaries(r in 0i64..MAX_SECS / 2) {
        let reference = instant(r);
        prop_assert_eq!(classify(reference, reference + Duration::days(29)), RiskLevel::High);
        prop_assert_eq!(classify(reference, reference + Duration::days(30)), RiskLevel::Medium);
        prop_assert_eq!(classify(reference, reference + Duration::days(59)), RiskLevel::Medium);
        prop_assert_eq!(classify(reference, reference + Duration::days(60)), RiskLevel::Low);
        prop_assert_eq!(classify(reference, reference - Duration::days(1)), RiskLevel::High);
    }

    /// A later expiration is never riskier.
    #[test]
    fn risk_is_monotonic_in_expiration(
        r in 0i64..MAX_SECS / 2,
        a in 0i64..200 * 86_400,
        b in 0i64..200 * 86_400,
    ) {
        let reference = instant(r);
        let (near, far) = if a <= b { (a, b) } else { (b, a) };
        let near_level = classify(reference, reference + Duration::seconds(near));
        let far_level = classify(reference, reference + Duration::seconds(far));
        prop_assert!(near_level >= far_level);
    }

    /// Load keeps order and every tier equals classify(now, expiration).
    #[test]
    fn load_preserves_order_and_risk(offsets in vec(-100i64..400, 0..40), r in 0i64..MAX_SECS / 2) {
        let reference = instant(r);
        let today = reference.date_naive();
        let records: Vec<_> = offsets
            .iter()
            .enumerate()
            .map(|(i, days)| record(i, today + Duration::days(*days)))
            .collect();

        let mut catalog = ContractCatalog::new();
        catalog.load(records.clone(), reference).expect("load");

        prop_assert_eq!(catalog.len(), records.len());
        for (contract, original) in catalog.iter().zip(&records) {
            prop_assert_eq!(contract.record(), original);
            prop_assert_eq!(
                contract.risk_level(),
                classify_date(reference, original.expiration_date)
            );
        }
    }

    /// add() always puts the new contract first and keeps the rest in order.
    #[test]
    fn add_prepends(count in 0usize..20) {
        let reference = instant(1_767_312_000);
        let today = reference.date_naive();
        let records: Vec<_> = (0..count).map(|i| record(i, today)).collect();

        let mut catalog = ContractCatalog::new();
        catalog.load(records, reference).expect("load");
        let before: Vec<_> = catalog.iter().map(|c| c.id().clone()).collect();

        catalog.add(record(count, today), reference).expect("add");

        let after: Vec<_> = catalog.iter().map(|c| c.id().clone()).collect();
        prop_assert_eq!(&after[0], &ContractId::new(format!("c-{count}")));
        prop_assert_eq!(&after[1..], &before[..]);
    }
}
