//! Expiration and aging classification.
//!
//! Pure functions over persisted state: nothing here is stored, so changing
//! the clock never requires a migration. Band thresholds are fixed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Expiration classification of a lot, by whole calendar days remaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpirationBand {
    /// Expiration date is in the past.
    Expired,
    /// 0 to 30 days remaining.
    Expiring,
    /// 31 to 90 days remaining.
    ExpiringSoon,
    /// More than 90 days remaining.
    Current,
}

impl ExpirationBand {
    /// Classify a whole-day count until expiration.
    #[must_use]
    pub const fn classify(days: i64) -> Self {
        match days {
            i64::MIN..=-1 => Self::Expired,
            0..=30 => Self::Expiring,
            31..=90 => Self::ExpiringSoon,
            _ => Self::Current,
        }
    }
}

/// Aging classification of stock at its current location, in whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingBand {
    /// At most 30 days in place.
    Recent,
    /// 31 to 60 days in place.
    Medium,
    /// More than 60 days in place.
    Old,
}

impl AgingBand {
    /// Classify a whole-day residency count.
    #[must_use]
    pub const fn classify(days: i64) -> Self {
        match days {
            i64::MIN..=30 => Self::Recent,
            31..=60 => Self::Medium,
            _ => Self::Old,
        }
    }
}

/// Whole calendar days from `today` until `expiration_date`.
///
/// Negative once the date has passed. Calendar-day semantics: a lot expiring
/// tomorrow reports 1 regardless of the time of day.
#[must_use]
pub fn days_until_expiration(expiration_date: NaiveDate, today: NaiveDate) -> i64 {
    (expiration_date - today).num_days()
}

/// Whole days a stock unit has been at its current location.
#[must_use]
pub fn aging_days(entered_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - entered_at).num_days()
}
