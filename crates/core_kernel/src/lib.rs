//! Core Kernel - Foundational types and utilities for the financial core
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Effective-dated periods for rate lookups
//! - Strongly-typed identifiers
//! - Collaborator port traits (PDF rendering, notifications, audit logging)

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use temporal::{EffectivePeriod, TemporalError};
pub use identifiers::{
    EstablishmentId, DocumentId, DocumentLineId,
    WalletId, WalletTransactionId, PaymentId, OrderId,
    AccountId, ProductId, CreditLimitId, DunningEventId,
};
pub use ports::{
    PortError, DomainPort, PdfRenderer, NotificationSender, Notification, AuditLogger,
};
