//! # Risk Classification
//!
//! Maps days-to-expiration onto a [`RiskLevel`].
//!
//! | Days remaining (ceil) | Tier   |
//! |-----------------------|--------|
//! | `< 30` (incl. negative) | High |
//! | `30..60`              | Medium |
//! | `>= 60`               | Low    |
//!
//! The reference instant is always a parameter. Nothing here reads a clock.

use crate::RiskLevel;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

// =============================================================================
// THRESHOLDS
// =============================================================================

/// Contracts with fewer days left than this are `High` risk.
pub const HIGH_RISK_WINDOW_DAYS: i64 = 30;

/// Contracts with fewer days left than this (and not `High`) are `Medium` risk.
pub const MEDIUM_RISK_WINDOW_DAYS: i64 = 60;

/// One day in milliseconds.
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

// =============================================================================
// CLASSIFIER
// =============================================================================

/// Whole days from `reference` to `expiration`, rounded up.
///
/// A partial day counts as a full day remaining; an expiration in the past
/// yields zero or a negative count.
#[must_use]
pub fn days_until(reference: DateTime<Utc>, expiration: DateTime<Utc>) -> i64 {
    let diff_ms = expiration
        .signed_duration_since(reference)
        .num_milliseconds();
    let whole = diff_ms.div_euclid(DAY_MS);
    if diff_ms.rem_euclid(DAY_MS) > 0 {
        whole.saturating_add(1)
    } else {
        whole
    }
}

/// Classify an expiration instant against a reference instant.
#[must_use]
pub fn classify(reference: DateTime<Utc>, expiration: DateTime<Utc>) -> RiskLevel {
    tier_for_days(days_until(reference, expiration))
}

/// Classify a calendar expiration date, read as 00:00 UTC on that day.
#[must_use]
pub fn classify_date(reference: DateTime<Utc>, expiration: NaiveDate) -> RiskLevel {
    classify(reference, start_of_day(expiration))
}

/// Days remaining until a calendar expiration date (00:00 UTC).
#[must_use]
pub fn days_until_date(reference: DateTime<Utc>, expiration: NaiveDate) -> i64 {
    days_until(reference, start_of_day(expiration))
}

/// The tier for an already-computed day count.
#[must_use]
pub fn tier_for_days(diff_days: i64) -> RiskLevel {
    if diff_days < HIGH_RISK_WINDOW_DAYS {
        RiskLevel::High
    } else if diff_days < MEDIUM_RISK_WINDOW_DAYS {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// 00:00 UTC on the given calendar date.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// TESTS
// =============================================================================
