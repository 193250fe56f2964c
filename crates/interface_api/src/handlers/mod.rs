//! HTTP request handlers

pub mod credit;
pub mod health;
pub mod invoicing;
pub mod wallet;
