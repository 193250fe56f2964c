//! Uuid-newtype identifiers, one per entity kind.
//!
//! A `PaymentId` cannot be passed where a `WalletId` is expected; the
//! compiler catches the swap. Displayed with a short prefix
//! (`PAY-018f...`) so log lines identify the entity kind at a glance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// A fresh random (v4) identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// A fresh time-ordered (v7) identifier, for rows that are
            /// listed by creation order
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// The display prefix for this identifier kind
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Invoicing domain identifiers
define_id!(EstablishmentId, "EST");
define_id!(DocumentId, "DOC");
define_id!(DocumentLineId, "LIN");

// Wallet domain identifiers
define_id!(WalletId, "WAL");
define_id!(WalletTransactionId, "WTX");

// Payments domain identifiers
define_id!(PaymentId, "PAY");
define_id!(OrderId, "ORD");

// Credit domain identifiers
define_id!(CreditLimitId, "CRL");
define_id!(DunningEventId, "DUN");

// Shared identifiers
define_id!(AccountId, "ACC");
define_id!(ProductId, "PRD");
