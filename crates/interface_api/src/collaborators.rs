//! Local adapters for the collaborator ports
//!
//! The real PDF renderer, mail gateway, and audit sink live outside this
//! core. These adapters satisfy the ports for development deployments:
//! the renderer fabricates storage keys, the notifier and audit logger
//! write structured log lines.

use std::time::Duration;

use async_trait::async_trait;
use core_kernel::{AuditLogger, DomainPort, Notification, NotificationSender, PdfRenderer, PortError};
use tracing::{debug, info};

/// PDF renderer that produces storage keys without rendering anything
#[derive(Debug, Default, Clone)]
pub struct StubPdfRenderer;

impl DomainPort for StubPdfRenderer {}

#[async_trait]
impl PdfRenderer for StubPdfRenderer {
    async fn generate_and_upload(
        &self,
        document_id: &str,
        document_number: &str,
    ) -> Result<String, PortError> {
        let storage_key = format!("documents/{}/{}.pdf", document_id, document_number);
        debug!(%storage_key, "Stub PDF uploaded");
        Ok(storage_key)
    }

    async fn signed_url(&self, storage_key: &str, ttl: Duration) -> Result<String, PortError> {
        Ok(format!(
            "https://files.marketplace.local/{}?expires_in={}",
            storage_key,
            ttl.as_secs()
        ))
    }
}

/// Notification sender that logs instead of emailing
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

impl DomainPort for LoggingNotifier {}

#[async_trait]
impl NotificationSender for LoggingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), PortError> {
        info!(
            account_id = %notification.account_id,
            subject = %notification.subject,
            "Notification dispatched"
        );
        Ok(())
    }
}

/// Audit logger backed by the tracing pipeline
#[derive(Debug, Default, Clone)]
pub struct TracingAuditLogger;

impl DomainPort for TracingAuditLogger {}

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log_action(
        &self,
        user_id: &str,
        entity_type: &str,
        entity_id: &str,
        action: &str,
    ) -> Result<(), PortError> {
        info!(
            user = %user_id,
            entity_type = %entity_type,
            entity_id = %entity_id,
            action = %action,
            "Audit entry"
        );
        Ok(())
    }
}
