//! Credit Domain - Limits and Dunning
//!
//! Buyer accounts trading on terms carry an approved credit limit and a
//! running used balance. The guard adjusts the balance as orders are
//! placed and settled, and enforces a pluggable over-limit policy:
//!
//! - [`OverLimitPolicy::AllowAndFlag`] (default): the purchase goes
//!   through and an unresolved [`CreditDunningEvent`] is recorded for the
//!   collections team.
//! - [`OverLimitPolicy::HardBlock`]: the balance change is refused; the
//!   refused attempt is still recorded as a dunning event.
//!
//! The used balance never goes negative: settlements that would overshoot
//! clamp at zero.

pub mod limit;
pub mod dunning;
pub mod guard;
pub mod ports;
pub mod error;

pub use limit::CreditLimit;
pub use dunning::CreditDunningEvent;
pub use guard::{CreditLimitGuard, OverLimitPolicy};
pub use ports::CreditStore;
pub use error::CreditError;
