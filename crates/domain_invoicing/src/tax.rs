//! Effective-dated tax rate resolution
//!
//! Rates are looked up by (country, tax class) as of a document's issue
//! date. The resolver never fails: a missing rate degrades to zero with a
//! warning, because omitting tax defensibly favors the buyer, while a hard
//! failure would block invoicing entirely. Resolved rates are snapshotted
//! into document lines, so later rate changes never affect issued documents.

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::{EffectivePeriod, Rate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::InvoicingError;
use crate::ports::TaxRateStore;

/// Well-known tax class names
pub mod tax_class {
    pub const STANDARD: &str = "STANDARD";
    pub const REDUCED: &str = "REDUCED";
    pub const EXEMPT: &str = "EXEMPT";
}

/// A published tax rate row
///
/// Immutable once published; superseded by inserting a new row with a later
/// `effective_from`. For a given (country, tax class) the effective ranges
/// must not overlap — the store enforces this on publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRate {
    /// ISO 3166-1 alpha-2 country code
    pub country_code: String,
    /// Tax class the rate applies to
    pub tax_class: String,
    /// The rate, 4 decimal places
    pub rate: Rate,
    /// When the rate applies
    pub effective: EffectivePeriod,
}

impl TaxRate {
    pub fn new(
        country_code: impl Into<String>,
        tax_class: impl Into<String>,
        rate: Rate,
        effective: EffectivePeriod,
    ) -> Self {
        Self {
            country_code: country_code.into(),
            tax_class: tax_class.into(),
            rate,
            effective,
        }
    }
}

/// Selects the applicable rate among candidate rows
///
/// Among rows whose effective period contains `as_of`, the one with the
/// latest `effective_from` wins.
pub fn select_applicable(rates: &[TaxRate], as_of: NaiveDate) -> Option<&TaxRate> {
    rates
        .iter()
        .filter(|r| r.effective.contains(as_of))
        .max_by_key(|r| r.effective.effective_from)
}

/// Resolves tax rates with the degrade-safe zero fallback
#[derive(Clone)]
pub struct TaxRateResolver {
    rates: Arc<dyn TaxRateStore>,
}

impl TaxRateResolver {
    pub fn new(rates: Arc<dyn TaxRateStore>) -> Self {
        Self { rates }
    }

    /// Returns the rate for (country, tax class) as of the given date
    ///
    /// Never fails on a missing rate: returns `Rate::zero()` and logs a
    /// warning. Store errors still propagate.
    pub async fn rate_for(
        &self,
        country_code: &str,
        tax_class: &str,
        as_of: NaiveDate,
    ) -> Result<Rate, InvoicingError> {
        let candidates = self.rates.applicable(country_code, tax_class, as_of).await?;

        match select_applicable(&candidates, as_of) {
            Some(row) => Ok(row.rate),
            None => {
                warn!(
                    country_code,
                    tax_class,
                    %as_of,
                    "No tax rate found, using zero rate"
                );
                Ok(Rate::zero())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rate_row(value: &str, from: NaiveDate, to: Option<NaiveDate>) -> TaxRate {
        let effective = match to {
            Some(to) => EffectivePeriod::new(from, to).unwrap(),
            None => EffectivePeriod::starting(from),
        };
        TaxRate::new("FR", tax_class::STANDARD, Rate::new(value.parse().unwrap()), effective)
    }

    #[test]
    fn test_latest_effective_from_wins() {
        let rates = vec![
            rate_row("0.196", d(2000, 1, 1), None),
            rate_row("0.20", d(2014, 1, 1), None),
        ];

        let selected = select_applicable(&rates, d(2024, 6, 1)).unwrap();
        assert_eq!(selected.rate.as_decimal(), dec!(0.20));
    }

    #[test]
    fn test_expired_rate_not_selected() {
        let rates = vec![rate_row("0.196", d(2000, 1, 1), Some(d(2013, 12, 31)))];
        assert!(select_applicable(&rates, d(2014, 1, 1)).is_none());
    }

    #[test]
    fn test_rate_effective_on_boundary_dates() {
        let rates = vec![rate_row("0.20", d(2024, 1, 1), Some(d(2024, 12, 31)))];
        assert!(select_applicable(&rates, d(2024, 1, 1)).is_some());
        assert!(select_applicable(&rates, d(2024, 12, 31)).is_some());
        assert!(select_applicable(&rates, d(2023, 12, 31)).is_none());
    }
}
