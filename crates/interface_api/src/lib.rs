//! HTTP API Layer
//!
//! This crate provides the REST API for the marketplace financial core
//! using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for each domain
//! - **Middleware**: Authentication, authorization, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Collaborators**: Local adapters for the PDF, notification, and audit ports
//! - **Error Handling**: Consistent error responses
//!
//! Payment processing has no public route: it is driven by order checkout,
//! which lives outside this core.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(pool, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod collaborators;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use core_kernel::AuditLogger;
use domain_credit::CreditLimitGuard;
use domain_invoicing::{InvoicingService, TaxRateResolver};
use domain_wallet::WalletLedger;
use infra_db::{PgCreditStore, PgDocumentStore, PgEstablishmentStore, PgTaxRateStore, PgWalletStore};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::collaborators::{LoggingNotifier, StubPdfRenderer, TracingAuditLogger};
use crate::config::ApiConfig;
use crate::handlers::{credit, health, invoicing, wallet};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: ApiConfig,
    pub invoicing: InvoicingService,
    pub ledger: WalletLedger,
    pub credit: CreditLimitGuard,
    pub audit: Arc<dyn AuditLogger>,
}

/// Creates the main API router
///
/// Wires the PostgreSQL stores and local collaborator adapters into the
/// domain services and mounts the route tree behind auth and audit
/// middleware.
pub fn create_router(pool: PgPool, config: ApiConfig) -> Router {
    let notifier = Arc::new(LoggingNotifier);

    let invoicing_service = InvoicingService::new(
        Arc::new(PgDocumentStore::new(pool.clone())),
        Arc::new(PgEstablishmentStore::new(pool.clone())),
        TaxRateResolver::new(Arc::new(PgTaxRateStore::new(pool.clone()))),
        Arc::new(StubPdfRenderer),
        notifier.clone(),
    );
    let ledger = WalletLedger::new(Arc::new(PgWalletStore::new(pool.clone())));
    let credit_guard = CreditLimitGuard::new(
        Arc::new(PgCreditStore::new(pool.clone())),
        config.over_limit_policy(),
    );

    let state = AppState {
        pool,
        config,
        invoicing: invoicing_service,
        ledger,
        credit: credit_guard,
        audit: Arc::new(TracingAuditLogger),
    };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Invoicing routes
    let invoicing_routes = Router::new()
        .route("/invoices", post(invoicing::create_invoice))
        .route("/invoices/:id", get(invoicing::get_invoice))
        .route("/invoices/:id/issue", post(invoicing::issue_invoice))
        .route("/invoices/:id/pdf-url", get(invoicing::pdf_url))
        .route("/credit-notes", post(invoicing::create_credit_note))
        .route("/credit-notes/:id/issue", post(invoicing::issue_credit_note))
        .route("/documents/:id/cancel", post(invoicing::cancel_document));

    // Wallet routes
    let wallet_routes = Router::new()
        .route("/top-up", post(wallet::top_up))
        .route("/transactions/:wallet_id", get(wallet::list_transactions))
        .route("/:account_id", get(wallet::get_wallet));

    // Credit routes
    let credit_routes = Router::new()
        .route("/limit/:account_id", get(credit::get_limit))
        .route("/available/:account_id", get(credit::get_available))
        .route("/increase-used", post(credit::increase_used))
        .route("/decrease-used", post(credit::decrease_used))
        .route("/dunning/:id", get(credit::list_dunning))
        .route("/dunning/:id/resolve", post(credit::resolve_dunning));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/invoicing", invoicing_routes)
        .nest("/wallet", wallet_routes)
        .nest("/credit", credit_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
