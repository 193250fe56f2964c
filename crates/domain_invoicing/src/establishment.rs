//! Issuing establishments
//!
//! An establishment is a legal/tax entity that issues fiscal documents,
//! identified by its own tax registration and country. The country code
//! drives tax rate resolution for every document the establishment issues.

use core_kernel::EstablishmentId;
use serde::{Deserialize, Serialize};

/// A registered issuing establishment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Establishment {
    /// Unique identifier
    pub id: EstablishmentId,
    /// Legal name
    pub name: String,
    /// ISO 3166-1 alpha-2 country code of the tax registration
    pub country_code: String,
    /// Tax registration number (VAT id or equivalent)
    pub tax_id: Option<String>,
    /// Inactive establishments cannot issue documents
    pub is_active: bool,
}

impl Establishment {
    pub fn new(
        id: EstablishmentId,
        name: impl Into<String>,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            country_code: country_code.into(),
            tax_id: None,
            is_active: true,
        }
    }

    /// Sets the tax registration number
    pub fn with_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.tax_id = Some(tax_id.into());
        self
    }
}
