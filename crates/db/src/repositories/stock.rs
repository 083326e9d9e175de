//! Stock repository: balances, adjustments, transfers, and the movement
//! ledger.
//!
//! Every mutation locks the affected `product_stock` row(s) with
//! `SELECT ... FOR UPDATE`, applies the pure arithmetic from
//! `facturo_core::stock`, and writes the balance together with its movement
//! record inside one transaction. Callers composing larger writes (the
//! document repository) reuse the `*_locked` helpers inside their own
//! transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use tracing::info;
use uuid::Uuid;

use facturo_core::stock::{
    adjustment_delta, apply_decrement, apply_increment, AdjustmentType, StockError,
};

use crate::entities::sea_orm_active_enums::MovementType;
use crate::entities::{product_stock, products, stock_movements};

/// Error types for stock operations.
#[derive(Debug, thiserror::Error)]
pub enum StockLedgerError {
    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    /// Product does not track stock; the ledger does not apply.
    #[error("Product {0} does not track stock")]
    ProductNotTracked(Uuid),

    /// The operation would drive the balance negative.
    #[error("Insufficient stock for product {product_id}: {source}")]
    Insufficient {
        /// The product short on stock.
        product_id: Uuid,
        /// The underlying guard failure with requested/available amounts.
        source: StockError,
    },

    /// Invalid quantity or transfer shape.
    #[error(transparent)]
    Ledger(#[from] StockError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for setting a product's opening balance in a workspace.
#[derive(Debug, Clone)]
pub struct SetInitialStockInput {
    /// Product to stock.
    pub product_id: Uuid,
    /// Workspace whose shelf is being set.
    pub workspace_id: Uuid,
    /// Opening quantity.
    pub quantity: Decimal,
    /// Low-stock threshold.
    pub minimum_quantity: Decimal,
    /// Optional reference for the audit trail.
    pub reference: Option<String>,
}

/// Input for a manual stock adjustment.
#[derive(Debug, Clone)]
pub struct StockAdjustmentInput {
    /// Product being adjusted.
    pub product_id: Uuid,
    /// Workspace whose balance is adjusted.
    pub workspace_id: Uuid,
    /// How to interpret `quantity`.
    pub adjustment_type: AdjustmentType,
    /// The adjustment quantity (target for set, delta for add/remove).
    pub quantity: Decimal,
    /// Human reason, stored on the movement.
    pub reason: String,
    /// Optional reference number.
    pub reference: Option<String>,
}

/// Input for a stock transfer between two workspaces.
#[derive(Debug, Clone)]
pub struct StockTransferInput {
    /// Product being moved.
    pub product_id: Uuid,
    /// Source workspace.
    pub from_workspace_id: Uuid,
    /// Destination workspace.
    pub to_workspace_id: Uuid,
    /// Quantity to move; must be positive.
    pub quantity: Decimal,
    /// Optional reference number.
    pub reference: Option<String>,
    /// Optional notes.
    pub notes: Option<String>,
}

/// Outcome of a stock transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Source balance after the transfer.
    pub from_level: product_stock::Model,
    /// Destination balance after the transfer.
    pub to_level: product_stock::Model,
    /// The single transfer movement recorded.
    pub movement: stock_movements::Model,
}

/// Filter options for listing stock movements.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    /// Filter by product.
    pub product_id: Option<Uuid>,
    /// Filter by movement type.
    pub movement_type: Option<MovementType>,
}

/// Fields for one movement ledger entry.
#[derive(Debug, Clone)]
pub(crate) struct MovementRecord {
    pub product_id: Uuid,
    pub workspace_id: Uuid,
    pub document_item_id: Option<Uuid>,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub reference_number: Option<String>,
    pub note: Option<String>,
    pub from_workspace_id: Option<Uuid>,
    pub to_workspace_id: Option<Uuid>,
}

/// Stock repository for balance and movement operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    db: DatabaseConnection,
}

impl StockRepository {
    /// Creates a new stock repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Sets (or overwrites) a product's opening balance in a workspace and
    /// records an `initial` movement carrying the new quantity.
    pub async fn set_initial_stock(
        &self,
        input: SetInitialStockInput,
    ) -> Result<(product_stock::Model, stock_movements::Model), StockLedgerError> {
        if input.quantity < Decimal::ZERO || input.minimum_quantity < Decimal::ZERO {
            return Err(StockError::InvalidQuantity(input.quantity).into());
        }

        let txn = self.db.begin().await?;
        Self::require_tracked_product(&txn, input.product_id).await?;

        let level = match Self::lock_level(&txn, input.product_id, input.workspace_id).await? {
            Some(existing) => {
                let mut active: product_stock::ActiveModel = existing.into();
                active.quantity = Set(input.quantity);
                active.minimum_quantity = Set(input.minimum_quantity);
                active.update(&txn).await?
            }
            None => Self::insert_level(
                &txn,
                input.product_id,
                input.workspace_id,
                input.quantity,
                input.minimum_quantity,
            )
            .await?,
        };

        let movement = Self::record_movement(
            &txn,
            MovementRecord {
                product_id: input.product_id,
                workspace_id: input.workspace_id,
                document_item_id: None,
                movement_type: MovementType::Initial,
                quantity: input.quantity,
                reference_number: input.reference,
                note: None,
                from_workspace_id: None,
                to_workspace_id: None,
            },
        )
        .await?;

        txn.commit().await?;

        info!(
            product_id = %input.product_id,
            workspace_id = %input.workspace_id,
            quantity = %input.quantity,
            "initial stock set"
        );

        Ok((level, movement))
    }

    /// Applies a manual adjustment and records an `adjustment` movement with
    /// the signed delta.
    ///
    /// `set_quantity` computes the delta against the current balance;
    /// `add_quantity`/`remove_quantity` are direct deltas. A resulting
    /// negative balance is rejected with no side effect.
    pub async fn adjust_stock(
        &self,
        input: StockAdjustmentInput,
    ) -> Result<(product_stock::Model, stock_movements::Model), StockLedgerError> {
        let txn = self.db.begin().await?;
        Self::require_tracked_product(&txn, input.product_id).await?;

        let level = match Self::lock_level(&txn, input.product_id, input.workspace_id).await? {
            Some(level) => level,
            // Adjusting a shelf that was never stocked starts from zero.
            None => {
                Self::insert_level(
                    &txn,
                    input.product_id,
                    input.workspace_id,
                    Decimal::ZERO,
                    Decimal::ZERO,
                )
                .await?
            }
        };

        let before = level.quantity;
        let delta = adjustment_delta(input.adjustment_type, before, input.quantity)
            .map_err(|source| Self::attribute(input.product_id, source))?;

        let mut active: product_stock::ActiveModel = level.into();
        active.quantity = Set(before + delta);
        let level = active.update(&txn).await?;

        let movement = Self::record_movement(
            &txn,
            MovementRecord {
                product_id: input.product_id,
                workspace_id: input.workspace_id,
                document_item_id: None,
                movement_type: MovementType::Adjustment,
                quantity: delta,
                reference_number: input.reference,
                note: Some(input.reason),
                from_workspace_id: None,
                to_workspace_id: None,
            },
        )
        .await?;

        txn.commit().await?;

        info!(
            product_id = %input.product_id,
            workspace_id = %input.workspace_id,
            before = %before,
            after = %level.quantity,
            "stock adjusted"
        );

        Ok((level, movement))
    }

    /// Moves stock between two workspaces atomically.
    ///
    /// Both stock rows are locked in workspace-UUID order (deadlock
    /// avoidance), the source is decremented under the insufficient-stock
    /// guard, the destination is incremented (its row created if absent),
    /// and exactly one `transfer` movement is recorded. The movement's
    /// signed quantity is negative - stock leaving the source - with
    /// `from_workspace_id`/`to_workspace_id` carrying the direction.
    pub async fn transfer_stock(
        &self,
        input: StockTransferInput,
    ) -> Result<TransferOutcome, StockLedgerError> {
        if input.from_workspace_id == input.to_workspace_id {
            return Err(StockError::SameWorkspace.into());
        }
        if input.quantity <= Decimal::ZERO {
            return Err(StockError::InvalidQuantity(input.quantity).into());
        }

        let txn = self.db.begin().await?;
        Self::require_tracked_product(&txn, input.product_id).await?;

        // Stable lock order prevents two opposing transfers from
        // deadlocking.
        let mut lock_order = [input.from_workspace_id, input.to_workspace_id];
        lock_order.sort_unstable();
        let mut locked = Vec::with_capacity(2);
        for workspace_id in lock_order {
            locked.push((
                workspace_id,
                Self::lock_level(&txn, input.product_id, workspace_id).await?,
            ));
        }
        let level_for = |workspace_id: Uuid| {
            locked
                .iter()
                .find(|(id, _)| *id == workspace_id)
                .and_then(|(_, level)| level.clone())
        };

        let source = level_for(input.from_workspace_id).ok_or_else(|| {
            Self::attribute(
                input.product_id,
                StockError::InsufficientStock {
                    requested: input.quantity,
                    available: Decimal::ZERO,
                },
            )
        })?;

        let source_after = apply_decrement(source.quantity, input.quantity)
            .map_err(|source| Self::attribute(input.product_id, source))?;
        let mut active: product_stock::ActiveModel = source.into();
        active.quantity = Set(source_after);
        let from_level = active.update(&txn).await?;

        let to_level = match level_for(input.to_workspace_id) {
            Some(destination) => {
                let destination_after = apply_increment(destination.quantity, input.quantity)?;
                let mut active: product_stock::ActiveModel = destination.into();
                active.quantity = Set(destination_after);
                active.update(&txn).await?
            }
            None => Self::insert_level(
                &txn,
                input.product_id,
                input.to_workspace_id,
                input.quantity,
                Decimal::ZERO,
            )
            .await?,
        };

        let movement = Self::record_movement(
            &txn,
            MovementRecord {
                product_id: input.product_id,
                workspace_id: input.from_workspace_id,
                document_item_id: None,
                movement_type: MovementType::Transfer,
                quantity: -input.quantity,
                reference_number: input.reference,
                note: input.notes,
                from_workspace_id: Some(input.from_workspace_id),
                to_workspace_id: Some(input.to_workspace_id),
            },
        )
        .await?;

        txn.commit().await?;

        info!(
            product_id = %input.product_id,
            from = %input.from_workspace_id,
            to = %input.to_workspace_id,
            quantity = %input.quantity,
            "stock transferred"
        );

        Ok(TransferOutcome {
            from_level,
            to_level,
            movement,
        })
    }

    /// Returns the stock level for a (product, workspace) pair.
    pub async fn get_level(
        &self,
        product_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Option<product_stock::Model>, StockLedgerError> {
        let level = product_stock::Entity::find()
            .filter(product_stock::Column::ProductId.eq(product_id))
            .filter(product_stock::Column::WorkspaceId.eq(workspace_id))
            .one(&self.db)
            .await?;
        Ok(level)
    }

    /// Lists all stock levels in a workspace.
    pub async fn list_levels(
        &self,
        workspace_id: Uuid,
    ) -> Result<Vec<product_stock::Model>, StockLedgerError> {
        let levels = product_stock::Entity::find()
            .filter(product_stock::Column::WorkspaceId.eq(workspace_id))
            .order_by_asc(product_stock::Column::ProductId)
            .all(&self.db)
            .await?;
        Ok(levels)
    }

    /// Lists levels below their low-stock threshold.
    pub async fn low_stock(
        &self,
        workspace_id: Uuid,
    ) -> Result<Vec<product_stock::Model>, StockLedgerError> {
        let levels = product_stock::Entity::find()
            .filter(product_stock::Column::WorkspaceId.eq(workspace_id))
            .filter(
                Expr::col(product_stock::Column::Quantity)
                    .lt(Expr::col(product_stock::Column::MinimumQuantity)),
            )
            .all(&self.db)
            .await?;
        Ok(levels)
    }

    /// Lists movements in a workspace, newest first.
    pub async fn list_movements(
        &self,
        workspace_id: Uuid,
        filter: MovementFilter,
    ) -> Result<Vec<stock_movements::Model>, StockLedgerError> {
        let mut query = stock_movements::Entity::find()
            .filter(stock_movements::Column::WorkspaceId.eq(workspace_id));

        if let Some(product_id) = filter.product_id {
            query = query.filter(stock_movements::Column::ProductId.eq(product_id));
        }
        if let Some(movement_type) = filter.movement_type {
            query = query.filter(stock_movements::Column::MovementType.eq(movement_type));
        }

        let movements = query
            .order_by_desc(stock_movements::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(movements)
    }

    // ------------------------------------------------------------------
    // Transaction-scoped helpers shared with the document repository
    // ------------------------------------------------------------------

    /// Locks the stock row for a (product, workspace) pair with
    /// `SELECT ... FOR UPDATE` inside the caller's transaction.
    pub(crate) async fn lock_level(
        txn: &DatabaseTransaction,
        product_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Option<product_stock::Model>, DbErr> {
        product_stock::Entity::find()
            .filter(product_stock::Column::ProductId.eq(product_id))
            .filter(product_stock::Column::WorkspaceId.eq(workspace_id))
            .lock_exclusive()
            .one(txn)
            .await
    }

    /// Locks and decrements a stock balance; fails with no side effect if
    /// the balance (or the missing row, treated as zero) cannot cover
    /// `quantity`.
    pub(crate) async fn decrement_locked(
        txn: &DatabaseTransaction,
        product_id: Uuid,
        workspace_id: Uuid,
        quantity: Decimal,
    ) -> Result<product_stock::Model, StockLedgerError> {
        let level = Self::lock_level(txn, product_id, workspace_id)
            .await?
            .ok_or_else(|| {
                Self::attribute(
                    product_id,
                    StockError::InsufficientStock {
                        requested: quantity,
                        available: Decimal::ZERO,
                    },
                )
            })?;

        let after = apply_decrement(level.quantity, quantity)
            .map_err(|source| Self::attribute(product_id, source))?;

        let mut active: product_stock::ActiveModel = level.into();
        active.quantity = Set(after);
        Ok(active.update(txn).await?)
    }

    /// Locks and increments a stock balance, creating the row if absent.
    pub(crate) async fn increment_locked(
        txn: &DatabaseTransaction,
        product_id: Uuid,
        workspace_id: Uuid,
        quantity: Decimal,
    ) -> Result<product_stock::Model, StockLedgerError> {
        match Self::lock_level(txn, product_id, workspace_id).await? {
            Some(level) => {
                let after = apply_increment(level.quantity, quantity)?;
                let mut active: product_stock::ActiveModel = level.into();
                active.quantity = Set(after);
                Ok(active.update(txn).await?)
            }
            None => {
                Ok(Self::insert_level(txn, product_id, workspace_id, quantity, Decimal::ZERO)
                    .await?)
            }
        }
    }

    /// Appends one movement ledger entry inside the caller's transaction.
    pub(crate) async fn record_movement(
        txn: &DatabaseTransaction,
        record: MovementRecord,
    ) -> Result<stock_movements::Model, DbErr> {
        stock_movements::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(record.product_id),
            workspace_id: Set(record.workspace_id),
            document_item_id: Set(record.document_item_id),
            movement_type: Set(record.movement_type),
            quantity: Set(record.quantity),
            reference_number: Set(record.reference_number),
            note: Set(record.note),
            from_workspace_id: Set(record.from_workspace_id),
            to_workspace_id: Set(record.to_workspace_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(txn)
        .await
    }

    async fn insert_level(
        txn: &DatabaseTransaction,
        product_id: Uuid,
        workspace_id: Uuid,
        quantity: Decimal,
        minimum_quantity: Decimal,
    ) -> Result<product_stock::Model, DbErr> {
        let now = Utc::now().into();
        product_stock::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            workspace_id: Set(workspace_id),
            quantity: Set(quantity),
            minimum_quantity: Set(minimum_quantity),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await
    }

    async fn require_tracked_product(
        txn: &DatabaseTransaction,
        product_id: Uuid,
    ) -> Result<products::Model, StockLedgerError> {
        let product = products::Entity::find_by_id(product_id)
            .one(txn)
            .await?
            .ok_or(StockLedgerError::ProductNotFound(product_id))?;
        if !product.track_stock {
            return Err(StockLedgerError::ProductNotTracked(product_id));
        }
        Ok(product)
    }

    fn attribute(product_id: Uuid, source: StockError) -> StockLedgerError {
        match source {
            StockError::InsufficientStock { .. } => StockLedgerError::Insufficient {
                product_id,
                source,
            },
            other => StockLedgerError::Ledger(other),
        }
    }
}
