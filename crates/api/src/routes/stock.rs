//! Stock routes: levels, movements, initial stock, adjustments, transfers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use crate::routes::app_error_response;
use facturo_core::stock::AdjustmentType;
use facturo_shared::AppError;
use facturo_db::entities::sea_orm_active_enums::MovementType;
use facturo_db::repositories::stock::{
    MovementFilter, SetInitialStockInput, StockAdjustmentInput, StockTransferInput,
};
use facturo_db::repositories::{StockLedgerError, StockRepository};

/// Creates the stock routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workspaces/{workspace_id}/stock", get(list_levels))
        .route(
            "/workspaces/{workspace_id}/stock/movements",
            get(list_movements),
        )
        .route(
            "/workspaces/{workspace_id}/stock/initial",
            post(set_initial_stock),
        )
        .route(
            "/workspaces/{workspace_id}/stock/adjustments",
            post(adjust_stock),
        )
        .route("/stock/transfers", post(transfer_stock))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing stock levels.
#[derive(Debug, Deserialize, Default)]
pub struct ListLevelsQuery {
    /// Only levels below their low-stock threshold.
    #[serde(default)]
    pub low: bool,
}

/// Query parameters for listing movements.
#[derive(Debug, Deserialize, Default)]
pub struct ListMovementsQuery {
    /// Filter by product.
    pub product: Option<Uuid>,
    /// Filter by movement type.
    #[serde(rename = "type")]
    pub movement_type: Option<String>,
}

/// Request body for setting initial stock.
#[derive(Debug, Deserialize)]
pub struct SetInitialStockRequest {
    /// Product to stock.
    pub product_id: Uuid,
    /// Opening quantity.
    pub quantity: Decimal,
    /// Low-stock threshold.
    #[serde(default)]
    pub minimum_quantity: Decimal,
    /// Optional reference for the audit trail.
    pub reference: Option<String>,
}

/// Request body for a stock adjustment.
#[derive(Debug, Deserialize)]
pub struct StockAdjustmentRequest {
    /// Product being adjusted.
    pub product_id: Uuid,
    /// "set_quantity", "add_quantity", or "remove_quantity".
    pub adjustment_type: String,
    /// The adjustment quantity.
    pub quantity: Decimal,
    /// Human reason, stored on the movement.
    pub reason: String,
    /// Optional reference number.
    pub reference: Option<String>,
}

/// Request body for a stock transfer.
#[derive(Debug, Deserialize)]
pub struct StockTransferRequest {
    /// Product being moved.
    pub product_id: Uuid,
    /// Source workspace.
    pub from_workspace_id: Uuid,
    /// Destination workspace.
    pub to_workspace_id: Uuid,
    /// Quantity to move.
    pub quantity: Decimal,
    /// Optional reference number.
    pub reference: Option<String>,
    /// Optional notes.
    pub notes: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/workspaces/{workspace_id}/stock` - List stock levels.
async fn list_levels(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    Query(query): Query<ListLevelsQuery>,
) -> Response {
    let repo = StockRepository::new((*state.db).clone());
    let result = if query.low {
        repo.low_stock(workspace_id).await
    } else {
        repo.list_levels(workspace_id).await
    };

    match result {
        Ok(levels) => (StatusCode::OK, Json(json!({ "data": levels }))).into_response(),
        Err(e) => stock_error_response(&e),
    }
}

/// GET `/workspaces/{workspace_id}/stock/movements` - List movements.
async fn list_movements(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    Query(query): Query<ListMovementsQuery>,
) -> Response {
    let movement_type = match query.movement_type.as_deref() {
        None => None,
        Some("initial") => Some(MovementType::Initial),
        Some("sale") => Some(MovementType::Sale),
        Some("adjustment") => Some(MovementType::Adjustment),
        Some("transfer") => Some(MovementType::Transfer),
        Some(_) => {
            return app_error_response(&AppError::field("type", "Unknown movement type"));
        }
    };

    let repo = StockRepository::new((*state.db).clone());
    let result = repo
        .list_movements(
            workspace_id,
            MovementFilter {
                product_id: query.product,
                movement_type,
            },
        )
        .await;

    match result {
        Ok(movements) => (StatusCode::OK, Json(json!({ "data": movements }))).into_response(),
        Err(e) => stock_error_response(&e),
    }
}

/// POST `/workspaces/{workspace_id}/stock/initial` - Set an opening balance.
async fn set_initial_stock(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<SetInitialStockRequest>,
) -> Response {
    let repo = StockRepository::new((*state.db).clone());
    let result = repo
        .set_initial_stock(SetInitialStockInput {
            product_id: payload.product_id,
            workspace_id,
            quantity: payload.quantity,
            minimum_quantity: payload.minimum_quantity,
            reference: payload.reference,
        })
        .await;

    match result {
        Ok((level, movement)) => (
            StatusCode::CREATED,
            Json(json!({ "data": { "level": level, "movement": movement } })),
        )
            .into_response(),
        Err(e) => stock_error_response(&e),
    }
}

/// POST `/workspaces/{workspace_id}/stock/adjustments` - Adjust a balance.
async fn adjust_stock(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<StockAdjustmentRequest>,
) -> Response {
    let adjustment_type = match payload.adjustment_type.as_str() {
        "set_quantity" => AdjustmentType::SetQuantity,
        "add_quantity" => AdjustmentType::AddQuantity,
        "remove_quantity" => AdjustmentType::RemoveQuantity,
        _ => {
            return app_error_response(&AppError::field(
                "adjustment_type",
                "Must be set_quantity, add_quantity, or remove_quantity",
            ));
        }
    };

    let repo = StockRepository::new((*state.db).clone());
    let result = repo
        .adjust_stock(StockAdjustmentInput {
            product_id: payload.product_id,
            workspace_id,
            adjustment_type,
            quantity: payload.quantity,
            reason: payload.reason,
            reference: payload.reference,
        })
        .await;

    match result {
        Ok((level, movement)) => (
            StatusCode::OK,
            Json(json!({ "data": { "level": level, "movement": movement } })),
        )
            .into_response(),
        Err(e) => stock_error_response(&e),
    }
}

/// POST `/stock/transfers` - Transfer stock between workspaces.
///
/// The one operation whose input names two workspaces; both ledgers change
/// in a single transaction.
async fn transfer_stock(
    State(state): State<AppState>,
    Json(payload): Json<StockTransferRequest>,
) -> Response {
    let repo = StockRepository::new((*state.db).clone());
    let result = repo
        .transfer_stock(StockTransferInput {
            product_id: payload.product_id,
            from_workspace_id: payload.from_workspace_id,
            to_workspace_id: payload.to_workspace_id,
            quantity: payload.quantity,
            reference: payload.reference,
            notes: payload.notes,
        })
        .await;

    match result {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "data": {
                    "from_level": outcome.from_level,
                    "to_level": outcome.to_level,
                    "movement": outcome.movement
                }
            })),
        )
            .into_response(),
        Err(e) => stock_error_response(&e),
    }
}

/// Maps stock repository errors to JSON responses.
fn stock_error_response(err: &StockLedgerError) -> Response {
    match err {
        StockLedgerError::ProductNotFound(_) => {
            app_error_response(&AppError::NotFound(err.to_string()))
        }
        StockLedgerError::ProductNotTracked(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "product_not_tracked",
                "message": err.to_string(),
                "fields": { "product_id": [err.to_string()] }
            })),
        )
            .into_response(),
        StockLedgerError::Insufficient { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "insufficient_stock",
                "message": err.to_string(),
                "fields": { "quantity": [err.to_string()] }
            })),
        )
            .into_response(),
        StockLedgerError::Ledger(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": e.error_code(),
                "message": e.to_string(),
                "fields": { "quantity": [e.to_string()] }
            })),
        )
            .into_response(),
        StockLedgerError::Database(e) => {
            error!(error = %e, "Stock operation failed");
            app_error_response(&AppError::Internal("An error occurred".to_string()))
        }
    }
}
