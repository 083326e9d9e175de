//! Sequence repository for document subtype (NCF range) operations.
//!
//! Owns the persistence half of fiscal numbering: subtype configuration,
//! the single-default invariant, and the locked read-advance-write cycle
//! that keeps `next_number` monotonic under concurrent writers.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use facturo_core::sequence::{NcfSequence, SequenceError, NCF_PREFIX_LEN};
use facturo_shared::types::DocumentSubtypeId;

use crate::entities::document_subtypes;

/// Error types for subtype/sequence operations.
#[derive(Debug, thiserror::Error)]
pub enum SubtypeError {
    /// Subtype not found.
    #[error("Document subtype not found: {0}")]
    NotFound(Uuid),

    /// Another subtype already owns this prefix.
    #[error("Prefix {0} is already in use by another subtype")]
    PrefixTaken(String),

    /// Prefix is not 3 ASCII alphanumeric characters.
    #[error("Invalid prefix: {0}")]
    InvalidPrefix(String),

    /// The numbering range is inconsistent (start < 1, end < start, or end
    /// below the already-consumed watermark).
    #[error("Invalid numbering range: {0}")]
    InvalidRange(String),

    /// Sequence-level validation failure (expired, exhausted).
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a document subtype.
#[derive(Debug, Clone)]
pub struct CreateSubtypeInput {
    /// Display name, e.g. "B01 - Factura de Crédito Fiscal".
    pub name: String,
    /// 3-character prefix; normalized to uppercase.
    pub prefix: String,
    /// First number of the range (inclusive).
    pub start_number: i64,
    /// Last number of the range (inclusive), if bounded.
    pub end_number: Option<i64>,
    /// Last date the sequence may issue numbers, if limited.
    pub valid_until_date: Option<NaiveDate>,
    /// Make this the default subtype for auto-allocation.
    pub is_default: bool,
}

/// Input for updating a document subtype. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateSubtypeInput {
    /// New display name.
    pub name: Option<String>,
    /// New upper bound for the range.
    pub end_number: Option<i64>,
    /// New validity date.
    pub valid_until_date: Option<NaiveDate>,
    /// Change the default flag.
    pub is_default: Option<bool>,
}

/// Normalizes and validates an NCF prefix: exactly 3 ASCII alphanumeric
/// characters, stored uppercase.
pub fn normalize_prefix(prefix: &str) -> Result<String, SubtypeError> {
    let trimmed = prefix.trim();
    if trimmed.len() != NCF_PREFIX_LEN || !trimmed.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(SubtypeError::InvalidPrefix(prefix.to_string()));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Converts an entity row into the pure sequence snapshot consumed by
/// `facturo-core`.
#[must_use]
pub fn subtype_snapshot(model: &document_subtypes::Model) -> NcfSequence {
    NcfSequence {
        id: DocumentSubtypeId::from_uuid(model.id),
        prefix: model.prefix.clone(),
        start_number: model.start_number,
        end_number: model.end_number,
        next_number: model.next_number,
        valid_until: model.valid_until_date,
    }
}

/// Repository for document subtype sequences.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    db: DatabaseConnection,
}

impl SequenceRepository {
    /// Creates a new sequence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a document subtype.
    ///
    /// Setting `is_default` clears the flag on every other subtype in the
    /// same transaction, so at most one default exists at any time.
    pub async fn create(
        &self,
        input: CreateSubtypeInput,
    ) -> Result<document_subtypes::Model, SubtypeError> {
        let prefix = normalize_prefix(&input.prefix)?;
        validate_range(input.start_number, input.end_number)?;

        let txn = self.db.begin().await?;

        let existing = document_subtypes::Entity::find()
            .filter(document_subtypes::Column::Prefix.eq(prefix.clone()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(SubtypeError::PrefixTaken(prefix));
        }

        if input.is_default {
            Self::clear_default(&txn).await?;
        }

        let now = Utc::now().into();
        let model = document_subtypes::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            prefix: Set(prefix),
            start_number: Set(input.start_number),
            end_number: Set(input.end_number),
            next_number: Set(input.start_number),
            valid_until_date: Set(input.valid_until_date),
            is_default: Set(input.is_default),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(model)
    }

    /// Updates a document subtype's configuration.
    ///
    /// The numbering prefix and counter are immutable here; `next_number`
    /// moves only through [`Self::advance`]. Narrowing `end_number` below
    /// the already-consumed watermark is rejected.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateSubtypeInput,
    ) -> Result<document_subtypes::Model, SubtypeError> {
        let txn = self.db.begin().await?;

        let model = document_subtypes::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(SubtypeError::NotFound(id))?;

        if let Some(end) = input.end_number {
            if end < model.start_number {
                return Err(SubtypeError::InvalidRange(format!(
                    "end_number {end} is below start_number {}",
                    model.start_number
                )));
            }
            if end < model.next_number - 1 {
                return Err(SubtypeError::InvalidRange(format!(
                    "end_number {end} is below the consumed watermark {}",
                    model.next_number - 1
                )));
            }
        }

        if input.is_default == Some(true) && !model.is_default {
            Self::clear_default(&txn).await?;
        }

        let mut active: document_subtypes::ActiveModel = model.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(end) = input.end_number {
            active.end_number = Set(Some(end));
        }
        if let Some(date) = input.valid_until_date {
            active.valid_until_date = Set(Some(date));
        }
        if let Some(is_default) = input.is_default {
            active.is_default = Set(is_default);
        }

        let updated = active.update(&txn).await?;
        txn.commit().await?;
        Ok(updated)
    }

    /// Lists all subtypes, default first.
    pub async fn list(&self) -> Result<Vec<document_subtypes::Model>, SubtypeError> {
        let subtypes = document_subtypes::Entity::find()
            .order_by_desc(document_subtypes::Column::IsDefault)
            .order_by_asc(document_subtypes::Column::Prefix)
            .all(&self.db)
            .await?;
        Ok(subtypes)
    }

    /// Finds a subtype by ID.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<document_subtypes::Model>, SubtypeError> {
        Ok(document_subtypes::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Finds a subtype by its prefix.
    pub async fn find_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<document_subtypes::Model>, SubtypeError> {
        let subtype = document_subtypes::Entity::find()
            .filter(document_subtypes::Column::Prefix.eq(prefix))
            .one(&self.db)
            .await?;
        Ok(subtype)
    }

    /// Finds the default subtype.
    pub async fn find_default(&self) -> Result<Option<document_subtypes::Model>, SubtypeError> {
        let subtype = document_subtypes::Entity::find()
            .filter(document_subtypes::Column::IsDefault.eq(true))
            .one(&self.db)
            .await?;
        Ok(subtype)
    }

    /// Re-reads a subtype row with `SELECT ... FOR UPDATE` inside the
    /// caller's transaction.
    ///
    /// Concurrent allocators serialize on this lock, which is what keeps
    /// two transactions from both reading the same `next_number`.
    pub async fn lock_by_id(
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<Option<document_subtypes::Model>, DbErr> {
        document_subtypes::Entity::find_by_id(id)
            .lock_exclusive()
            .one(txn)
            .await
    }

    /// Locks a subtype row by prefix inside the caller's transaction.
    pub async fn lock_by_prefix(
        txn: &DatabaseTransaction,
        prefix: &str,
    ) -> Result<Option<document_subtypes::Model>, DbErr> {
        document_subtypes::Entity::find()
            .filter(document_subtypes::Column::Prefix.eq(prefix))
            .lock_exclusive()
            .one(txn)
            .await
    }

    /// Records that `used_number` has been consumed: persists
    /// `next_number = max(next_number, used_number + 1)`.
    ///
    /// Must run on a row previously fetched with [`Self::lock_by_id`] or
    /// [`Self::lock_by_prefix`], inside the same transaction as the
    /// document write it guards - rollback then reverts the document and
    /// the counter together.
    pub async fn advance(
        txn: &DatabaseTransaction,
        model: document_subtypes::Model,
        used_number: i64,
    ) -> Result<document_subtypes::Model, DbErr> {
        let next = subtype_snapshot(&model).advanced_to(used_number);
        if next == model.next_number {
            return Ok(model);
        }

        debug!(
            prefix = %model.prefix,
            from = model.next_number,
            to = next,
            "advancing sequence counter"
        );

        let mut active: document_subtypes::ActiveModel = model.into();
        active.next_number = Set(next);
        active.update(txn).await
    }

    /// Returns the next number of a locked subtype row after checking
    /// expiry and exhaustion, without consuming it.
    pub fn peek_allocation(
        model: &document_subtypes::Model,
        today: NaiveDate,
    ) -> Result<(String, i64), SubtypeError> {
        let sequence = subtype_snapshot(model);
        if sequence.is_expired(today) {
            return Err(SequenceError::SequenceExpired {
                prefix: sequence.prefix.clone(),
                valid_until: sequence.valid_until.unwrap_or_default(),
            }
            .into());
        }
        if sequence.is_exhausted(sequence.next_number) {
            return Err(SequenceError::SequenceExhausted {
                prefix: sequence.prefix.clone(),
                number: sequence.next_number,
                end_number: sequence.end_number.unwrap_or_default(),
            }
            .into());
        }
        Ok((sequence.peek_next(), sequence.next_number))
    }

    async fn clear_default(txn: &DatabaseTransaction) -> Result<(), DbErr> {
        document_subtypes::Entity::update_many()
            .col_expr(
                document_subtypes::Column::IsDefault,
                sea_orm::sea_query::Expr::value(false),
            )
            .filter(document_subtypes::Column::IsDefault.eq(true))
            .exec(txn)
            .await?;
        Ok(())
    }
}

fn validate_range(start: i64, end: Option<i64>) -> Result<(), SubtypeError> {
    if start < 1 {
        return Err(SubtypeError::InvalidRange(format!(
            "start_number must be at least 1, got {start}"
        )));
    }
    if let Some(end) = end {
        if end < start {
            return Err(SubtypeError::InvalidRange(format!(
                "end_number {end} is below start_number {start}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "sequence_tests.rs"]
mod tests;
