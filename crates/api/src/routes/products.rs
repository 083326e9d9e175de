//! Product routes.
//!
//! Create/list/get only - the inventory surface needs products and their
//! `track_stock` flag; richer catalog management is out of scope.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use crate::routes::app_error_response;
use facturo_db::repositories::{CreateProductInput, ProductError, ProductRepository};
use facturo_shared::AppError;

/// Creates the product routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{product_id}", get(get_product))
}

/// Request body for creating a product.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    /// Display name.
    pub name: String,
    /// Unique stock-keeping unit.
    pub sku: String,
    /// Optional description.
    pub description: Option<String>,
    /// Default unit price.
    pub unit_price: Decimal,
    /// Whether the stock ledger applies.
    #[serde(default = "default_track_stock")]
    pub track_stock: bool,
}

fn default_track_stock() -> bool {
    true
}

/// GET `/products` - List products.
async fn list_products(State(state): State<AppState>) -> Response {
    let repo = ProductRepository::new((*state.db).clone());
    match repo.list().await {
        Ok(products) => (StatusCode::OK, Json(json!({ "data": products }))).into_response(),
        Err(e) => product_error_response(&e),
    }
}

/// POST `/products` - Create a product.
async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Response {
    if payload.unit_price < Decimal::ZERO {
        return app_error_response(&AppError::field("unit_price", "Must not be negative"));
    }

    let repo = ProductRepository::new((*state.db).clone());
    let result = repo
        .create(CreateProductInput {
            name: payload.name,
            sku: payload.sku,
            description: payload.description,
            unit_price: payload.unit_price,
            track_stock: payload.track_stock,
        })
        .await;

    match result {
        Ok(product) => (StatusCode::CREATED, Json(json!({ "data": product }))).into_response(),
        Err(e) => product_error_response(&e),
    }
}

/// GET `/products/{product_id}` - Get a product.
async fn get_product(State(state): State<AppState>, Path(product_id): Path<Uuid>) -> Response {
    let repo = ProductRepository::new((*state.db).clone());
    match repo.find_by_id(product_id).await {
        Ok(Some(product)) => (StatusCode::OK, Json(json!({ "data": product }))).into_response(),
        Ok(None) => product_error_response(&ProductError::NotFound(product_id)),
        Err(e) => product_error_response(&e),
    }
}

/// Maps product repository errors to JSON responses.
fn product_error_response(err: &ProductError) -> Response {
    match err {
        ProductError::NotFound(_) => {
            app_error_response(&AppError::NotFound("Product not found".to_string()))
        }
        ProductError::SkuTaken(sku) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "sku_taken",
                "message": err.to_string(),
                "fields": { "sku": [format!("El SKU {sku} ya está en uso")] }
            })),
        )
            .into_response(),
        ProductError::Database(e) => {
            error!(error = %e, "Product operation failed");
            app_error_response(&AppError::Internal("An error occurred".to_string()))
        }
    }
}
