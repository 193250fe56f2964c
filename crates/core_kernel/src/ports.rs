//! Ports for storage and external collaborators
//!
//! Every domain defines port traits for the things it needs from the
//! outside world; adapters implement them. The financial core has two
//! kinds of ports:
//!
//! - **Storage ports**, defined per domain (e.g. `DocumentStore`,
//!   `WalletStore`), implemented by `infra_db` against PostgreSQL and by
//!   in-memory doubles for tests.
//! - **Collaborator ports**, defined here, for subsystems that live outside
//!   the core (PDF rendering/object storage, email notification, audit
//!   logging). These are called fire-and-forget: the core never depends on
//!   their success for correctness.
//!
//! ```rust,ignore
//! pub struct InvoicingService {
//!     documents: Arc<dyn DocumentStore>,
//!     pdf: Arc<dyn PdfRenderer>,
//! }
//! ```

use std::fmt;
use std::time::Duration;
use async_trait::async_trait;
use thiserror::Error;

/// The one error type every port speaks.
///
/// Adapters translate their native failures (SQL errors, HTTP errors)
/// into these variants; domain services only ever match on this.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
    },

    /// Uniqueness or overlap constraint violated.
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Worth retrying: the failure is in the transport, not the request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. } | PortError::Timeout { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker bound for port traits: object-safe across threads and tasks.
pub trait DomainPort: Send + Sync + 'static {}

/// Renders a billing document to PDF and uploads it to object storage
///
/// Called post-commit and best-effort: a failed render leaves the document
/// without a PDF, recoverable by retrying on the next access.
#[async_trait]
pub trait PdfRenderer: DomainPort {
    /// Renders the document and uploads it, returning the storage key
    async fn generate_and_upload(
        &self,
        document_id: &str,
        document_number: &str,
    ) -> Result<String, PortError>;

    /// Produces a time-limited signed URL for a previously uploaded PDF
    async fn signed_url(&self, storage_key: &str, ttl: Duration) -> Result<String, PortError>;
}

/// A customer-facing notification (email or equivalent)
#[derive(Debug, Clone)]
pub struct Notification {
    /// Account the notification is addressed to
    pub account_id: String,
    /// Short subject line
    pub subject: String,
    /// Body text
    pub body: String,
}

/// Sends customer notifications
///
/// Dispatch is fire-and-forget; failures are logged by the caller and never
/// block or fail the owning operation.
#[async_trait]
pub trait NotificationSender: DomainPort {
    async fn send(&self, notification: Notification) -> Result<(), PortError>;
}

/// Records user-attributable actions for compliance
#[async_trait]
pub trait AuditLogger: DomainPort {
    async fn log_action(
        &self,
        user_id: &str,
        entity_type: &str,
        entity_id: &str,
        action: &str,
    ) -> Result<(), PortError>;
}
