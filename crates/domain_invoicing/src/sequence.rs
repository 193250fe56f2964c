//! Document number sequence allocation
//!
//! Fiscal documents carry externally visible, gap-free sequential numbers.
//! Each (establishment, sequence name) pair owns a counter row; allocation
//! is an atomic store-side increment so concurrent callers can never observe
//! or persist the same value, regardless of how many service instances run
//! against the same store.
//!
//! Formatting is pure domain logic over the counter's metadata and happens
//! after the increment.

use std::sync::Arc;

use core_kernel::EstablishmentId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::InvoicingError;
use crate::ports::SequenceStore;

/// Sequence name for invoice numbering
pub const INVOICE_SEQUENCE: &str = "INVOICE";

/// Sequence name for credit note numbering
pub const CREDIT_NOTE_SEQUENCE: &str = "CREDIT_NOTE";

/// A provisioned counter row for one (establishment, sequence name) pair
///
/// Provisioned once per establishment and document type; mutated only by
/// atomic increment; never deleted while active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceCounter {
    /// Establishment the counter belongs to
    pub establishment_id: EstablishmentId,
    /// Sequence name (e.g. "INVOICE", "CREDIT_NOTE")
    pub sequence_name: String,
    /// Last allocated value
    pub current_value: i64,
    /// Literal prefix prepended to the formatted number
    pub prefix: Option<String>,
    /// Literal suffix appended to the formatted number
    pub suffix: Option<String>,
    /// Format pattern containing an `N`-run token (see [`format_document_number`])
    pub format_pattern: Option<String>,
    /// Inactive counters refuse allocation
    pub is_active: bool,
}

impl SequenceCounter {
    /// Creates an active counter starting at `initial_value`
    pub fn new(
        establishment_id: EstablishmentId,
        sequence_name: impl Into<String>,
        initial_value: i64,
    ) -> Self {
        Self {
            establishment_id,
            sequence_name: sequence_name.into(),
            current_value: initial_value,
            prefix: None,
            suffix: None,
            format_pattern: None,
            is_active: true,
        }
    }

    /// Sets the prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the suffix
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Sets the format pattern
    pub fn with_format_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.format_pattern = Some(pattern.into());
        self
    }
}

/// The result of one atomic counter increment
#[derive(Debug, Clone)]
pub struct Allocation {
    /// Counter metadata as of the allocation
    pub counter: SequenceCounter,
    /// The allocated raw value
    pub value: i64,
}

impl Allocation {
    /// Formats the allocated value per the counter's pattern
    pub fn formatted(&self) -> String {
        format_document_number(&self.counter, self.value)
    }
}

/// Width tokens recognized in a format pattern, longest first.
///
/// Exactly one substitution is applied: the longest token present in the
/// pattern wins. A pattern containing no token falls back to the default
/// 7-digit zero padding.
const WIDTH_TOKENS: &[(&str, usize)] = &[("NNNNNNN", 7), ("NNNNN", 5), ("NNN", 3)];

/// Formats a raw counter value into a document number
///
/// The default rendering is the value zero-padded to 7 digits, wrapped with
/// the counter's prefix and suffix. A `format_pattern` may override the
/// padded portion by embedding one of the `N`-run tokens.
pub fn format_document_number(counter: &SequenceCounter, value: i64) -> String {
    let prefix = counter.prefix.as_deref().unwrap_or("");
    let suffix = counter.suffix.as_deref().unwrap_or("");

    let body = match counter.format_pattern.as_deref() {
        Some(pattern) => {
            let substituted = WIDTH_TOKENS.iter().find_map(|(token, width)| {
                if pattern.contains(token) {
                    Some(pattern.replacen(token, &zero_pad(value, *width), 1))
                } else {
                    None
                }
            });
            substituted.unwrap_or_else(|| zero_pad(value, 7))
        }
        None => zero_pad(value, 7),
    };

    format!("{}{}{}", prefix, body, suffix)
}

fn zero_pad(value: i64, width: usize) -> String {
    format!("{:0width$}", value, width = width)
}

/// Allocates and formats document numbers
///
/// Thin service over the [`SequenceStore`] port: the store performs the
/// serialized read-increment-write, this service formats the result.
#[derive(Clone)]
pub struct SequenceAllocator {
    sequences: Arc<dyn SequenceStore>,
}

impl SequenceAllocator {
    pub fn new(sequences: Arc<dyn SequenceStore>) -> Self {
        Self { sequences }
    }

    /// Allocates the next number for the given establishment and sequence
    ///
    /// # Errors
    ///
    /// Returns `InvoicingError::NotFound` if no active counter row exists
    /// for the key.
    pub async fn next(
        &self,
        establishment_id: EstablishmentId,
        sequence_name: &str,
    ) -> Result<String, InvoicingError> {
        let allocation = self.sequences.allocate(establishment_id, sequence_name).await?;
        let number = allocation.formatted();

        debug!(
            establishment_id = %establishment_id,
            sequence_name,
            value = allocation.value,
            number = %number,
            "Allocated document number"
        );

        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> SequenceCounter {
        SequenceCounter::new(EstablishmentId::new(), INVOICE_SEQUENCE, 0)
    }

    #[test]
    fn test_default_format_is_seven_digits() {
        assert_eq!(format_document_number(&counter(), 42), "0000042");
    }

    #[test]
    fn test_prefix_and_suffix_wrap_the_number() {
        let c = counter().with_prefix("S").with_suffix("-FR");
        assert_eq!(format_document_number(&c, 42), "S0000042-FR");
    }

    #[test]
    fn test_longest_token_wins() {
        // A pattern containing both a 7-run and (therefore) a 3-run must be
        // substituted exactly once, at the longest run.
        let c = counter().with_format_pattern("INV-NNNNNNN");
        assert_eq!(format_document_number(&c, 42), "INV-0000042");
    }

    #[test]
    fn test_five_digit_token() {
        let c = counter().with_format_pattern("NNNNN/24");
        assert_eq!(format_document_number(&c, 123), "00123/24");
    }

    #[test]
    fn test_three_digit_token() {
        let c = counter().with_format_pattern("B-NNN");
        assert_eq!(format_document_number(&c, 7), "B-007");
    }

    #[test]
    fn test_tokenless_pattern_falls_back_to_default_padding() {
        let c = counter().with_format_pattern("LEGACY");
        assert_eq!(format_document_number(&c, 9), "0000009");
    }

    #[test]
    fn test_value_wider_than_token_is_not_truncated() {
        let c = counter().with_format_pattern("B-NNN");
        assert_eq!(format_document_number(&c, 12345), "B-12345");
    }
}
