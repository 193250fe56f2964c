//! Repository implementations of the domain storage ports

mod sequences;
mod establishments;
mod tax_rates;
mod documents;
mod wallets;
mod payments;
mod orders;
mod credit;

pub use sequences::PgSequenceStore;
pub use establishments::PgEstablishmentStore;
pub use tax_rates::PgTaxRateStore;
pub use documents::PgDocumentStore;
pub use wallets::PgWalletStore;
pub use payments::PgPaymentStore;
pub use orders::PgOrderStore;
pub use credit::PgCreditStore;

use core_kernel::{Currency, Money, PortError};
use rust_decimal::Decimal;

use crate::error::corrupt;

/// Rebuilds a Money value from its stored amount and currency code
pub(crate) fn money_from_row(amount: Decimal, currency: &str) -> Result<Money, PortError> {
    let currency = Currency::from_code(currency)
        .map_err(|_| corrupt(format!("Unknown stored currency '{}'", currency)))?;
    Ok(Money::new(amount, currency))
}
