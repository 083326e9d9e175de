//! Product repository.
//!
//! Minimal surface: the stock and document subsystems need product lookups
//! and the `track_stock` flag; everything beyond create/find/list is out of
//! scope.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::products;

/// Error types for product operations.
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    /// Product not found.
    #[error("Product not found: {0}")]
    NotFound(Uuid),

    /// Another product already uses this SKU.
    #[error("SKU {0} is already in use")]
    SkuTaken(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct CreateProductInput {
    /// Display name.
    pub name: String,
    /// Unique stock-keeping unit.
    pub sku: String,
    /// Optional description.
    pub description: Option<String>,
    /// Default unit price.
    pub unit_price: Decimal,
    /// Whether the stock ledger applies to this product.
    pub track_stock: bool,
}

/// Product repository.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: DatabaseConnection,
}

impl ProductRepository {
    /// Creates a new product repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a product.
    pub async fn create(
        &self,
        input: CreateProductInput,
    ) -> Result<products::Model, ProductError> {
        let existing = products::Entity::find()
            .filter(products::Column::Sku.eq(input.sku.clone()))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(ProductError::SkuTaken(input.sku));
        }

        let now = Utc::now().into();
        let product = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            sku: Set(input.sku),
            description: Set(input.description),
            unit_price: Set(input.unit_price),
            track_stock: Set(input.track_stock),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        Ok(product)
    }

    /// Finds a product by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<products::Model>, ProductError> {
        Ok(products::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Lists all products by SKU.
    pub async fn list(&self) -> Result<Vec<products::Model>, ProductError> {
        let products = products::Entity::find()
            .order_by_asc(products::Column::Sku)
            .all(&self.db)
            .await?;
        Ok(products)
    }
}
