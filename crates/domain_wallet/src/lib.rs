//! Wallet Domain - Prepaid Balance Ledger
//!
//! Each account owns at most one wallet per currency, holding a prepaid
//! balance that is topped up, debited by payments, and credited by refunds.
//! Every balance change appends an immutable [`WalletTransaction`], so the
//! ledger invariant always holds:
//!
//! ```text
//! balance = Σ top-ups − Σ debits + Σ refunds
//! ```
//!
//! The balance can never go negative. Debits are conditional at the store
//! level: a debit against insufficient funds is reported as an outcome, not
//! an error, because the caller (the payment processor) treats it as a
//! declined payment rather than a fault.

pub mod wallet;
pub mod transaction;
pub mod ledger;
pub mod ports;
pub mod error;

pub use wallet::Wallet;
pub use transaction::{TransactionType, WalletTransaction};
pub use ledger::{DebitOutcome, WalletLedger};
pub use ports::WalletStore;
pub use error::WalletError;
