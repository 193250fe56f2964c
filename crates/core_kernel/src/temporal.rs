//! Effective-dated period handling
//!
//! Tax rates and similar reference data are effective-dated: each row
//! carries a date range during which it applies, and superseding a value
//! means inserting a new row with a later `effective_from` rather than
//! mutating the old one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur constructing temporal values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: effective_to {to} precedes effective_from {from}")]
    InvertedPeriod { from: NaiveDate, to: NaiveDate },
}

/// A half-closed effective date range: `[effective_from, effective_to]`
///
/// An open-ended period (`effective_to == None`) applies indefinitely
/// until a superseding row takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePeriod {
    /// First date (inclusive) on which the value applies
    pub effective_from: NaiveDate,
    /// Last date (inclusive) on which the value applies, if bounded
    pub effective_to: Option<NaiveDate>,
}

impl EffectivePeriod {
    /// Creates a bounded period
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, TemporalError> {
        if to < from {
            return Err(TemporalError::InvertedPeriod { from, to });
        }
        Ok(Self {
            effective_from: from,
            effective_to: Some(to),
        })
    }

    /// Creates an open-ended period starting at `from`
    pub fn starting(from: NaiveDate) -> Self {
        Self {
            effective_from: from,
            effective_to: None,
        }
    }

    /// Returns true if the period applies on the given date
    pub fn contains(&self, date: NaiveDate) -> bool {
        if date < self.effective_from {
            return false;
        }
        match self.effective_to {
            Some(to) => date <= to,
            None => true,
        }
    }

    /// Returns true if this period overlaps another
    ///
    /// Used to enforce the non-overlap invariant for (country, tax class)
    /// rate rows.
    pub fn overlaps(&self, other: &EffectivePeriod) -> bool {
        let self_ends_before = match self.effective_to {
            Some(to) => to < other.effective_from,
            None => false,
        };
        let other_ends_before = match other.effective_to {
            Some(to) => to < self.effective_from,
            None => false,
        };
        !(self_ends_before || other_ends_before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_bounded_period_contains() {
        let p = EffectivePeriod::new(d(2024, 1, 1), d(2024, 12, 31)).unwrap();
        assert!(p.contains(d(2024, 1, 1)));
        assert!(p.contains(d(2024, 12, 31)));
        assert!(!p.contains(d(2023, 12, 31)));
        assert!(!p.contains(d(2025, 1, 1)));
    }

    #[test]
    fn test_open_ended_period_contains() {
        let p = EffectivePeriod::starting(d(2024, 6, 1));
        assert!(p.contains(d(2030, 1, 1)));
        assert!(!p.contains(d(2024, 5, 31)));
    }

    #[test]
    fn test_inverted_period_rejected() {
        let result = EffectivePeriod::new(d(2024, 6, 1), d(2024, 1, 1));
        assert!(matches!(result, Err(TemporalError::InvertedPeriod { .. })));
    }

    #[test]
    fn test_overlap_detection() {
        let a = EffectivePeriod::new(d(2024, 1, 1), d(2024, 6, 30)).unwrap();
        let b = EffectivePeriod::new(d(2024, 6, 1), d(2024, 12, 31)).unwrap();
        let c = EffectivePeriod::starting(d(2024, 7, 1));

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&c));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_adjacent_periods_do_not_overlap() {
        let a = EffectivePeriod::new(d(2024, 1, 1), d(2024, 6, 30)).unwrap();
        let b = EffectivePeriod::starting(d(2024, 7, 1));
        assert!(!a.overlaps(&b));
    }
}
