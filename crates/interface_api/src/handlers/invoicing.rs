//! Invoicing handlers

use axum::{
    extract::{Path, State},
    Json,
};
use core_kernel::DocumentId;
use uuid::Uuid;
use validator::Validate;

use crate::dto::invoicing::{
    CreateCreditNoteRequest, CreateInvoiceRequest, DocumentResponse, PdfUrlResponse,
};
use crate::{error::ApiError, AppState};

/// Creates a draft invoice with an allocated document number
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<Json<DocumentResponse>, ApiError> {
    request.validate()?;

    let document = state.invoicing.create_invoice(request.into_command()?).await?;
    Ok(Json(document.into()))
}

/// Fetches a billing document by id
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = state
        .invoicing
        .get_document(DocumentId::from_uuid(id))
        .await?;
    Ok(Json(document.into()))
}

/// Issues a draft invoice
pub async fn issue_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = state
        .invoicing
        .issue_invoice(DocumentId::from_uuid(id))
        .await?;
    Ok(Json(document.into()))
}

/// Returns a signed, time-limited URL for the document's PDF
pub async fn pdf_url(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PdfUrlResponse>, ApiError> {
    let url = state.invoicing.pdf_url(DocumentId::from_uuid(id)).await?;
    Ok(Json(PdfUrlResponse { url }))
}

/// Creates a draft credit note against an issued invoice
pub async fn create_credit_note(
    State(state): State<AppState>,
    Json(request): Json<CreateCreditNoteRequest>,
) -> Result<Json<DocumentResponse>, ApiError> {
    request.validate()?;

    let document = state
        .invoicing
        .create_credit_note(request.into_command())
        .await?;
    Ok(Json(document.into()))
}

/// Issues a draft credit note
pub async fn issue_credit_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = state
        .invoicing
        .issue_credit_note(DocumentId::from_uuid(id))
        .await?;
    Ok(Json(document.into()))
}

/// Cancels a draft document; its allocated number stays consumed
pub async fn cancel_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = state
        .invoicing
        .cancel_document(DocumentId::from_uuid(id))
        .await?;
    Ok(Json(document.into()))
}
