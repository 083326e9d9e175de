//! Fiscal document routes: create, list, get, update, delete, convert.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use crate::routes::app_error_response;
use facturo_core::document::{
    DocumentItemInput, DocumentKind, DocumentStatus, SubmittedItem,
};
use facturo_core::sequence::SequenceError;
use facturo_db::entities::{document_items, fiscal_documents};
use facturo_db::repositories::document::{
    CreateDocumentInput, DocumentFilter, UpdateDocumentInput,
};
use facturo_db::repositories::{DocumentRepository, DocumentWithItems, DocumentWriteError, StockLedgerError};
use facturo_shared::AppError;
use facturo_shared::types::{DocumentItemId, PageRequest, ProductId};

/// Creates the document routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/workspaces/{workspace_id}/documents",
            get(list_documents).post(create_document),
        )
        .route(
            "/workspaces/{workspace_id}/documents/{document_id}",
            get(get_document)
                .patch(update_document)
                .delete(delete_document),
        )
        .route(
            "/workspaces/{workspace_id}/documents/{document_id}/convert",
            post(convert_document),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing documents.
#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    /// Filter by kind: "invoice" or "quotation".
    pub kind: Option<String>,
    /// Filter by status.
    pub status: Option<String>,
    /// Filter by contact.
    pub contact: Option<Uuid>,
    /// Filter by issue date range start (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Filter by issue date range end (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

/// Request body for a single line item.
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    /// Existing line item ID (update path only).
    pub id: Option<Uuid>,
    /// Product being sold.
    pub product_id: Uuid,
    /// Quantity; must be positive.
    pub quantity: Decimal,
    /// Unit price.
    pub unit_price: Decimal,
    /// Discount percentage.
    pub discount_rate: Option<Decimal>,
    /// Absolute discount amount.
    pub discount_amount: Option<Decimal>,
    /// Tax percentage.
    pub tax_rate: Option<Decimal>,
    /// Absolute tax amount.
    pub tax_amount: Option<Decimal>,
}

/// Request body for creating a document.
#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    /// "invoice" or "quotation".
    pub kind: String,
    /// Billed contact.
    pub contact_id: Uuid,
    /// Subtype to number from; the default subtype when absent.
    pub document_subtype_id: Option<Uuid>,
    /// Caller-supplied NCF; auto-allocated when absent.
    pub ncf: Option<String>,
    /// Issue date (YYYY-MM-DD).
    pub issue_date: NaiveDate,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Optional notes.
    pub notes: Option<String>,
    /// Initial status; defaults to "pending".
    pub status: Option<String>,
    /// Line items.
    pub items: Vec<ItemRequest>,
}

/// Request body for updating a document.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateDocumentRequest {
    /// New billed contact.
    pub contact_id: Option<Uuid>,
    /// New subtype.
    pub document_subtype_id: Option<Uuid>,
    /// New NCF.
    pub ncf: Option<String>,
    /// New issue date.
    pub issue_date: Option<NaiveDate>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
    /// New notes.
    pub notes: Option<String>,
    /// New status.
    pub status: Option<String>,
    /// Full replacement item set.
    pub items: Option<Vec<ItemRequest>>,
}

/// Request body for converting a quotation.
#[derive(Debug, Deserialize, Default)]
pub struct ConvertDocumentRequest {
    /// Subtype the invoice should number from; the default when absent.
    pub document_subtype_id: Option<Uuid>,
}

/// Response for a document with its items.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    /// Document header.
    pub document: fiscal_documents::Model,
    /// Line items.
    pub items: Vec<document_items::Model>,
}

impl From<DocumentWithItems> for DocumentResponse {
    fn from(value: DocumentWithItems) -> Self {
        Self {
            document: value.document,
            items: value.items,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/workspaces/{workspace_id}/documents` - List documents.
async fn list_documents(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    Query(query): Query<ListDocumentsQuery>,
) -> Response {
    let kind = match query.kind.as_deref().map(parse_kind).transpose() {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let status = match query.status.as_deref().map(parse_status).transpose() {
        Ok(status) => status,
        Err(response) => return response,
    };

    let page = PageRequest {
        page: query.page.unwrap_or(1),
        per_page: query.limit.unwrap_or(20).min(100),
    };

    let repo = DocumentRepository::new((*state.db).clone());
    let result = repo
        .list_documents(
            workspace_id,
            DocumentFilter {
                kind,
                status,
                contact_id: query.contact,
                date_from: query.from,
                date_to: query.to,
            },
            page,
        )
        .await;

    match result {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => write_error_response(&e),
    }
}

/// POST `/workspaces/{workspace_id}/documents` - Create a document.
async fn create_document(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<CreateDocumentRequest>,
) -> Response {
    let kind = match parse_kind(&payload.kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let status = match payload.status.as_deref().map(parse_status).transpose() {
        Ok(status) => status,
        Err(response) => return response,
    };

    let repo = DocumentRepository::new((*state.db).clone());
    let result = repo
        .create_document(CreateDocumentInput {
            kind,
            workspace_id,
            contact_id: payload.contact_id,
            document_subtype_id: payload.document_subtype_id,
            ncf: payload.ncf,
            issue_date: payload.issue_date,
            due_date: payload.due_date,
            notes: payload.notes,
            status,
            items: payload.items.iter().map(item_input).collect(),
        })
        .await;

    match result {
        Ok(created) => (
            StatusCode::CREATED,
            Json(json!({ "data": DocumentResponse::from(created) })),
        )
            .into_response(),
        Err(e) => write_error_response(&e),
    }
}

/// GET `/workspaces/{workspace_id}/documents/{document_id}` - Get a document.
async fn get_document(
    State(state): State<AppState>,
    Path((workspace_id, document_id)): Path<(Uuid, Uuid)>,
) -> Response {
    let repo = DocumentRepository::new((*state.db).clone());
    match repo.get_document(workspace_id, document_id).await {
        Ok(found) => (
            StatusCode::OK,
            Json(json!({ "data": DocumentResponse::from(found) })),
        )
            .into_response(),
        Err(e) => write_error_response(&e),
    }
}

/// PATCH `/workspaces/{workspace_id}/documents/{document_id}` - Update a
/// document.
async fn update_document(
    State(state): State<AppState>,
    Path((workspace_id, document_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> Response {
    let status = match payload.status.as_deref().map(parse_status).transpose() {
        Ok(status) => status,
        Err(response) => return response,
    };

    let repo = DocumentRepository::new((*state.db).clone());

    // Scope check before writing: the document must live in this workspace.
    if let Err(e) = repo.get_document(workspace_id, document_id).await {
        return write_error_response(&e);
    }

    let items = payload.items.map(|items| {
        items
            .iter()
            .map(|item| SubmittedItem {
                id: item.id.map(DocumentItemId::from_uuid),
                input: item_input(item),
            })
            .collect()
    });

    let result = repo
        .update_document(
            document_id,
            UpdateDocumentInput {
                contact_id: payload.contact_id,
                document_subtype_id: payload.document_subtype_id,
                ncf: payload.ncf,
                issue_date: payload.issue_date,
                due_date: payload.due_date,
                notes: payload.notes,
                status,
                items,
            },
        )
        .await;

    match result {
        Ok(updated) => (
            StatusCode::OK,
            Json(json!({ "data": DocumentResponse::from(updated) })),
        )
            .into_response(),
        Err(e) => write_error_response(&e),
    }
}

/// DELETE `/workspaces/{workspace_id}/documents/{document_id}` - Soft-delete
/// a document, returning its stock.
async fn delete_document(
    State(state): State<AppState>,
    Path((workspace_id, document_id)): Path<(Uuid, Uuid)>,
) -> Response {
    let repo = DocumentRepository::new((*state.db).clone());

    if let Err(e) = repo.get_document(workspace_id, document_id).await {
        return write_error_response(&e);
    }

    match repo.delete_document(document_id).await {
        Ok(document) => (StatusCode::OK, Json(json!({ "data": document }))).into_response(),
        Err(e) => write_error_response(&e),
    }
}

/// POST `/workspaces/{workspace_id}/documents/{document_id}/convert` -
/// Convert a quotation into an invoice.
async fn convert_document(
    State(state): State<AppState>,
    Path((workspace_id, document_id)): Path<(Uuid, Uuid)>,
    payload: Option<Json<ConvertDocumentRequest>>,
) -> Response {
    let repo = DocumentRepository::new((*state.db).clone());

    if let Err(e) = repo.get_document(workspace_id, document_id).await {
        return write_error_response(&e);
    }

    let subtype_id = payload.and_then(|Json(body)| body.document_subtype_id);
    match repo.convert_quotation(document_id, subtype_id).await {
        Ok(invoice) => (
            StatusCode::CREATED,
            Json(json!({ "data": DocumentResponse::from(invoice) })),
        )
            .into_response(),
        Err(e) => write_error_response(&e),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn item_input(item: &ItemRequest) -> DocumentItemInput {
    DocumentItemInput {
        product_id: ProductId::from_uuid(item.product_id),
        quantity: item.quantity,
        unit_price: item.unit_price,
        discount_rate: item.discount_rate,
        discount_amount: item.discount_amount,
        tax_rate: item.tax_rate,
        tax_amount: item.tax_amount,
    }
}

fn parse_kind(value: &str) -> Result<DocumentKind, Response> {
    match value {
        "invoice" => Ok(DocumentKind::Invoice),
        "quotation" => Ok(DocumentKind::Quotation),
        _ => Err(app_error_response(&AppError::field(
            "kind",
            "Must be 'invoice' or 'quotation'",
        ))),
    }
}

fn parse_status(value: &str) -> Result<DocumentStatus, Response> {
    match value {
        "draft" => Ok(DocumentStatus::Draft),
        "pending" => Ok(DocumentStatus::Pending),
        "paid" => Ok(DocumentStatus::Paid),
        "cancelled" => Ok(DocumentStatus::Cancelled),
        "converted" => Ok(DocumentStatus::Converted),
        "deleted" => Ok(DocumentStatus::Deleted),
        _ => Err(app_error_response(&AppError::field(
            "status",
            "Unknown document status",
        ))),
    }
}

/// Maps document write errors to JSON responses with field-keyed validation
/// details.
fn write_error_response(err: &DocumentWriteError) -> Response {
    match err {
        DocumentWriteError::NotFound(_) => {
            app_error_response(&AppError::NotFound("Document not found".to_string()))
        }
        DocumentWriteError::WorkspaceNotFound(_)
        | DocumentWriteError::ContactNotFound(_)
        | DocumentWriteError::ProductNotFound(_)
        | DocumentWriteError::SubtypeNotFound(_) => {
            app_error_response(&AppError::NotFound(err.to_string()))
        }
        DocumentWriteError::NoDefaultSubtype => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "no_default_subtype",
                "message": err.to_string(),
                "fields": { "document_subtype_id": ["No default document subtype is configured"] }
            })),
        )
            .into_response(),
        DocumentWriteError::SubtypeMismatch { .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "subtype_mismatch",
                "message": err.to_string(),
                "fields": { "ncf": [err.to_string()] }
            })),
        )
            .into_response(),
        DocumentWriteError::Sequence(e) => sequence_error_response(e),
        DocumentWriteError::Stock(e) => stock_error_response(e),
        DocumentWriteError::Domain(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": e.error_code(),
                "message": e.to_string(),
                "fields": { "items": [e.to_string()] }
            })),
        )
            .into_response(),
        DocumentWriteError::Database(e) => {
            error!(error = %e, "Document write failed");
            app_error_response(&AppError::Internal("An error occurred".to_string()))
        }
    }
}

fn sequence_error_response(err: &SequenceError) -> Response {
    let message = match err {
        SequenceError::NumberInUse(_) => "El NCF ya está en uso".to_string(),
        other => other.to_string(),
    };
    let status = if matches!(err, SequenceError::NumberInUse(_)) {
        StatusCode::CONFLICT
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": message.clone(),
            "fields": { "ncf": [message] }
        })),
    )
        .into_response()
}

fn stock_error_response(err: &StockLedgerError) -> Response {
    match err {
        StockLedgerError::Insufficient { product_id, source } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "insufficient_stock",
                "message": format!("Producto {product_id}: {source}"),
                "fields": { "items": [format!("Producto {product_id}: {source}")] }
            })),
        )
            .into_response(),
        StockLedgerError::ProductNotFound(_) | StockLedgerError::ProductNotTracked(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "invalid_product",
                "message": err.to_string(),
                "fields": { "items": [err.to_string()] }
            })),
        )
            .into_response(),
        StockLedgerError::Ledger(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": e.error_code(),
                "message": e.to_string(),
                "fields": { "items": [e.to_string()] }
            })),
        )
            .into_response(),
        StockLedgerError::Database(e) => {
            error!(error = %e, "Stock operation failed");
            app_error_response(&AppError::Internal("An error occurred".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn parse_kind_accepts_both_kinds() {
        assert_eq!(parse_kind("invoice").unwrap(), DocumentKind::Invoice);
        assert_eq!(parse_kind("quotation").unwrap(), DocumentKind::Quotation);
        assert!(parse_kind("receipt").is_err());
    }

    #[rstest]
    #[case("draft", DocumentStatus::Draft)]
    #[case("pending", DocumentStatus::Pending)]
    #[case("paid", DocumentStatus::Paid)]
    #[case("cancelled", DocumentStatus::Cancelled)]
    #[case("converted", DocumentStatus::Converted)]
    #[case("deleted", DocumentStatus::Deleted)]
    fn parse_status_accepts_every_status(#[case] raw: &str, #[case] expected: DocumentStatus) {
        assert_eq!(parse_status(raw).unwrap(), expected);
    }

    #[test]
    fn parse_status_rejects_unknown_values() {
        assert!(parse_status("unknown").is_err());
    }
}
