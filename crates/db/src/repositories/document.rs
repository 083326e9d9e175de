//! Document repository: the transactional write paths for invoices and
//! quotations.
//!
//! Every write path composes the same pieces inside one database
//! transaction: NCF validation (`facturo_core::sequence`), the locked
//! sequence advance (`SequenceRepository`), and per-line stock
//! reconciliation (`StockRepository` + `facturo_core::stock`). Any failure
//! propagates uncaught so the transaction rolls back in full - no partial
//! document, counter, or ledger state ever persists.
//!
//! Quotations never move stock; only invoice line items own SALE movements.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{error, info};
use uuid::Uuid;

use facturo_core::document::{
    diff_items, document_totals, line_amounts, DocumentError, DocumentItemInput,
    DocumentKind as CoreKind, DocumentStatus as CoreStatus, DocumentTotals, ExistingItem,
    LineAmounts, SubmittedItem,
};
use facturo_core::sequence::{format_ncf, split_ncf, validate_candidate, SequenceError};
use facturo_core::stock::{
    reconcile_item_change, sale_movement_quantity, StockDelta,
};
use facturo_shared::types::{DocumentItemId, PageRequest, PageResponse, ProductId};

use crate::entities::sea_orm_active_enums::{DocumentStatus, MovementType};
use crate::entities::{
    contacts, document_items, document_subtypes, fiscal_documents, products, stock_movements,
    workspaces,
};
use crate::repositories::sequence::{subtype_snapshot, SequenceRepository, SubtypeError};
use crate::repositories::stock::{MovementRecord, StockLedgerError, StockRepository};

/// Error types for document write operations.
#[derive(Debug, thiserror::Error)]
pub enum DocumentWriteError {
    /// Document not found.
    #[error("Document not found: {0}")]
    NotFound(Uuid),

    /// Workspace not found.
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(Uuid),

    /// Contact not found in the document's workspace.
    #[error("Contact not found: {0}")]
    ContactNotFound(Uuid),

    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    /// Document subtype not found.
    #[error("Document subtype not found: {0}")]
    SubtypeNotFound(Uuid),

    /// Auto-allocation requested but no default subtype is configured.
    #[error("No default document subtype is configured")]
    NoDefaultSubtype,

    /// The supplied NCF belongs to a different subtype than the one named.
    #[error("NCF prefix {prefix} does not match document subtype {supplied}")]
    SubtypeMismatch {
        /// The subtype the caller named.
        supplied: Uuid,
        /// The prefix the candidate number carries.
        prefix: String,
    },

    /// Fiscal number validation failure.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// Stock validation or ledger failure.
    #[error(transparent)]
    Stock(#[from] StockLedgerError),

    /// Domain-level input/state failure.
    #[error(transparent)]
    Domain(#[from] DocumentError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<SubtypeError> for DocumentWriteError {
    fn from(err: SubtypeError) -> Self {
        match err {
            SubtypeError::Sequence(err) => Self::Sequence(err),
            SubtypeError::Database(err) => Self::Database(err),
            SubtypeError::NotFound(id) => Self::SubtypeNotFound(id),
            other => Self::Database(DbErr::Custom(other.to_string())),
        }
    }
}

/// Input for creating a document.
#[derive(Debug, Clone)]
pub struct CreateDocumentInput {
    /// Invoice or quotation.
    pub kind: CoreKind,
    /// Workspace issuing the document.
    pub workspace_id: Uuid,
    /// Billed contact.
    pub contact_id: Uuid,
    /// Subtype to draw the number from; the default subtype when absent.
    pub document_subtype_id: Option<Uuid>,
    /// Caller-supplied NCF; auto-allocated when absent.
    pub ncf: Option<String>,
    /// Issue date; sequence validity is checked against it.
    pub issue_date: NaiveDate,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Optional notes.
    pub notes: Option<String>,
    /// Initial status; defaults to pending.
    pub status: Option<CoreStatus>,
    /// Line items; at least one.
    pub items: Vec<DocumentItemInput>,
}

/// Input for updating a document. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentInput {
    /// New billed contact.
    pub contact_id: Option<Uuid>,
    /// New subtype; triggers re-numbering when it differs.
    pub document_subtype_id: Option<Uuid>,
    /// New NCF; re-validated and re-advanced when it differs.
    pub ncf: Option<String>,
    /// New issue date.
    pub issue_date: Option<NaiveDate>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
    /// New notes.
    pub notes: Option<String>,
    /// New status.
    pub status: Option<CoreStatus>,
    /// Full replacement item set, diffed against the existing one.
    pub items: Option<Vec<SubmittedItem>>,
}

/// Filter options for listing documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Filter by kind.
    pub kind: Option<CoreKind>,
    /// Filter by status.
    pub status: Option<CoreStatus>,
    /// Filter by contact.
    pub contact_id: Option<Uuid>,
    /// Filter by issue date range start.
    pub date_from: Option<NaiveDate>,
    /// Filter by issue date range end.
    pub date_to: Option<NaiveDate>,
}

/// A document with its line items.
#[derive(Debug, Clone)]
pub struct DocumentWithItems {
    /// Document header.
    pub document: fiscal_documents::Model,
    /// Line items.
    pub items: Vec<document_items::Model>,
}

/// Document repository for transactional write operations.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    db: DatabaseConnection,
}

impl DocumentRepository {
    /// Creates a new document repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a document: validates or allocates the NCF, advances the
    /// subtype counter, writes the header with server-computed totals, and
    /// runs the stock create-path for every line item.
    ///
    /// All of it happens in one transaction; if any line fails stock
    /// validation, no item, no movement, no counter advance, and no
    /// document row persists.
    pub async fn create_document(
        &self,
        input: CreateDocumentInput,
    ) -> Result<DocumentWithItems, DocumentWriteError> {
        if input.items.is_empty() {
            return Err(DocumentError::EmptyItems.into());
        }
        let status = input.status.unwrap_or(CoreStatus::Pending);
        validate_assignable_status(status, input.kind, "create")?;

        let lines = compute_lines(&input.items)?;
        let totals = document_totals(&lines.iter().map(|(_, amounts)| *amounts).collect::<Vec<_>>());

        let txn = self.db.begin().await?;

        Self::require_workspace(&txn, input.workspace_id).await?;
        Self::require_contact(&txn, input.workspace_id, input.contact_id).await?;

        // Lock the sequence row first; everything number-related happens
        // under that lock.
        let (subtype, number, canonical) = Self::resolve_number(
            &txn,
            input.ncf.as_deref(),
            input.document_subtype_id,
            input.issue_date,
            None,
        )
        .await?;
        SequenceRepository::advance(&txn, subtype.clone(), number).await?;

        let now = Utc::now().into();
        let document = fiscal_documents::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(input.kind.into()),
            workspace_id: Set(input.workspace_id),
            contact_id: Set(input.contact_id),
            document_subtype_id: Set(subtype.id),
            document_number: Set(canonical),
            issue_date: Set(input.issue_date),
            due_date: Set(input.due_date),
            status: Set(status.into()),
            subtotal_amount: Set(totals.subtotal_amount),
            discount_amount: Set(totals.discount_amount),
            tax_amount: Set(totals.tax_amount),
            total_amount: Set(totals.total_amount),
            notes: Set(input.notes.clone()),
            converted_document_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for (item_input, amounts) in &lines {
            items.push(
                Self::insert_item_with_stock(&txn, &document, item_input, *amounts).await?,
            );
        }

        txn.commit().await?;

        info!(
            document_id = %document.id,
            kind = %input.kind,
            number = %document.document_number,
            total = %document.total_amount,
            "document created"
        );

        Ok(DocumentWithItems { document, items })
    }

    /// Updates a document: diffs the submitted item set against the
    /// existing one, routes each line through the reconciler's
    /// create/update/delete path, patches whitelisted header fields, and
    /// re-runs NCF validation + sequence advance when the number changes.
    pub async fn update_document(
        &self,
        id: Uuid,
        input: UpdateDocumentInput,
    ) -> Result<DocumentWithItems, DocumentWriteError> {
        let txn = self.db.begin().await?;

        let document = fiscal_documents::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(DocumentWriteError::NotFound(id))?;

        let kind: CoreKind = document.kind.clone().into();
        let current_status: CoreStatus = document.status.clone().into();
        if !current_status.is_editable() {
            return Err(DocumentError::InvalidStatus {
                status: current_status,
                action: "update",
            }
            .into());
        }
        if let Some(status) = input.status {
            validate_assignable_status(status, kind, "assign")?;
        }

        if let Some(contact_id) = input.contact_id {
            if contact_id != document.contact_id {
                Self::require_contact(&txn, document.workspace_id, contact_id).await?;
            }
        }

        // Item reconciliation first; header totals derive from the result.
        if let Some(submitted) = &input.items {
            Self::reconcile_items(&txn, &document, kind, submitted).await?;
        }

        // Re-numbering, if requested. The candidate is canonicalized first
        // so an unpadded rendering of the current number is a no-op, not a
        // watermark violation.
        let issue_date = input.issue_date.unwrap_or(document.issue_date);
        let changed_number = match &input.ncf {
            Some(candidate) => {
                let (prefix, number) = split_ncf(candidate)?;
                format_ncf(prefix, number) != document.document_number
            }
            None => false,
        };
        let renumber = match &input.ncf {
            Some(candidate) if changed_number => Some(
                Self::resolve_number(
                    &txn,
                    Some(candidate),
                    input.document_subtype_id,
                    issue_date,
                    Some(document.id),
                )
                .await?,
            ),
            _ => match input.document_subtype_id {
                Some(subtype_id) if subtype_id != document.document_subtype_id => Some(
                    Self::resolve_number(&txn, None, Some(subtype_id), issue_date, None).await?,
                ),
                _ => None,
            },
        };

        let document_id = document.id;
        let workspace_id = document.workspace_id;
        let mut active: fiscal_documents::ActiveModel = document.into();

        if let Some((subtype, number, canonical)) = renumber {
            SequenceRepository::advance(&txn, subtype.clone(), number).await?;
            active.document_subtype_id = Set(subtype.id);
            active.document_number = Set(canonical);
        }
        if let Some(contact_id) = input.contact_id {
            active.contact_id = Set(contact_id);
        }
        if let Some(date) = input.issue_date {
            active.issue_date = Set(date);
        }
        if let Some(date) = input.due_date {
            active.due_date = Set(Some(date));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(status) = input.status {
            active.status = Set(status.into());
        }

        // Stored totals always equal the sum of the (possibly reconciled)
        // items.
        let items = Self::load_items(&txn, document_id).await?;
        let totals = totals_from_rows(&items);
        active.subtotal_amount = Set(totals.subtotal_amount);
        active.discount_amount = Set(totals.discount_amount);
        active.tax_amount = Set(totals.tax_amount);
        active.total_amount = Set(totals.total_amount);

        let document = active.update(&txn).await?;
        txn.commit().await?;

        info!(
            document_id = %document.id,
            workspace_id = %workspace_id,
            number = %document.document_number,
            "document updated"
        );

        Ok(DocumentWithItems { document, items })
    }

    /// Converts a quotation into a brand-new invoice.
    ///
    /// The invoice draws a fresh NCF from its own subtype (the named one or
    /// the default) - never the quotation's number - and consumes stock via
    /// the full create-path, since quotations never move stock. The source
    /// quotation is marked converted and linked to the invoice.
    pub async fn convert_quotation(
        &self,
        id: Uuid,
        subtype_id: Option<Uuid>,
    ) -> Result<DocumentWithItems, DocumentWriteError> {
        let txn = self.db.begin().await?;

        let quotation = fiscal_documents::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(DocumentWriteError::NotFound(id))?;

        let kind: CoreKind = quotation.kind.clone().into();
        if kind != CoreKind::Quotation {
            return Err(DocumentError::KindMismatch {
                expected: CoreKind::Quotation,
                actual: kind,
            }
            .into());
        }
        let status: CoreStatus = quotation.status.clone().into();
        if !status.is_editable() {
            return Err(DocumentError::InvalidStatus {
                status,
                action: "convert",
            }
            .into());
        }

        let quotation_items = Self::load_items(&txn, quotation.id).await?;

        let today = Utc::now().date_naive();
        let (subtype, number, canonical) =
            Self::resolve_number(&txn, None, subtype_id, today, None).await?;
        SequenceRepository::advance(&txn, subtype.clone(), number).await?;

        let now = Utc::now().into();
        let invoice = fiscal_documents::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(CoreKind::Invoice.into()),
            workspace_id: Set(quotation.workspace_id),
            contact_id: Set(quotation.contact_id),
            document_subtype_id: Set(subtype.id),
            document_number: Set(canonical),
            issue_date: Set(today),
            due_date: Set(quotation.due_date),
            status: Set(DocumentStatus::Pending),
            subtotal_amount: Set(quotation.subtotal_amount),
            discount_amount: Set(quotation.discount_amount),
            tax_amount: Set(quotation.tax_amount),
            total_amount: Set(quotation.total_amount),
            notes: Set(quotation.notes.clone()),
            converted_document_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(quotation_items.len());
        for row in &quotation_items {
            let item_input = input_from_row(row);
            let amounts = line_amounts(&item_input)?;
            items.push(Self::insert_item_with_stock(&txn, &invoice, &item_input, amounts).await?);
        }

        let mut source: fiscal_documents::ActiveModel = quotation.into();
        source.status = Set(DocumentStatus::Converted);
        source.converted_document_id = Set(Some(invoice.id));
        source.update(&txn).await?;

        txn.commit().await?;

        info!(
            quotation_id = %id,
            invoice_id = %invoice.id,
            number = %invoice.document_number,
            "quotation converted to invoice"
        );

        Ok(DocumentWithItems {
            document: invoice,
            items,
        })
    }

    /// Soft-deletes a document: returns all consumed stock, removes the SALE
    /// movements, and marks the row deleted. Items and the document itself
    /// are preserved for audit.
    pub async fn delete_document(
        &self,
        id: Uuid,
    ) -> Result<fiscal_documents::Model, DocumentWriteError> {
        let txn = self.db.begin().await?;

        let document = fiscal_documents::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(DocumentWriteError::NotFound(id))?;

        let status: CoreStatus = document.status.clone().into();
        if status == CoreStatus::Deleted {
            return Err(DocumentError::InvalidStatus {
                status,
                action: "delete",
            }
            .into());
        }

        let items = Self::load_items(&txn, document.id).await?;
        for item in &items {
            if let Some(movement) = Self::find_sale_movement(&txn, item.id).await? {
                StockRepository::increment_locked(
                    &txn,
                    item.product_id,
                    document.workspace_id,
                    item.quantity,
                )
                .await?;
                info!(
                    document_item_id = %item.id,
                    product_id = %item.product_id,
                    quantity = %item.quantity,
                    "stock returned on document delete"
                );
                movement.delete(&txn).await?;
            }
        }

        let mut active: fiscal_documents::ActiveModel = document.into();
        active.status = Set(DocumentStatus::Deleted);
        let document = active.update(&txn).await?;

        txn.commit().await?;
        Ok(document)
    }

    /// Gets a document with its items, scoped to a workspace.
    pub async fn get_document(
        &self,
        workspace_id: Uuid,
        id: Uuid,
    ) -> Result<DocumentWithItems, DocumentWriteError> {
        let document = fiscal_documents::Entity::find_by_id(id)
            .filter(fiscal_documents::Column::WorkspaceId.eq(workspace_id))
            .one(&self.db)
            .await?
            .ok_or(DocumentWriteError::NotFound(id))?;

        let items = document
            .find_related(document_items::Entity)
            .order_by_asc(document_items::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(DocumentWithItems { document, items })
    }

    /// Finds a document by its fiscal number, across all workspaces.
    pub async fn find_by_number(
        &self,
        document_number: &str,
    ) -> Result<Option<fiscal_documents::Model>, DocumentWriteError> {
        let document = fiscal_documents::Entity::find()
            .filter(fiscal_documents::Column::DocumentNumber.eq(document_number))
            .one(&self.db)
            .await?;
        Ok(document)
    }

    /// Lists documents in a workspace with optional filters, newest first.
    pub async fn list_documents(
        &self,
        workspace_id: Uuid,
        filter: DocumentFilter,
        page: PageRequest,
    ) -> Result<PageResponse<fiscal_documents::Model>, DocumentWriteError> {
        let mut query = fiscal_documents::Entity::find()
            .filter(fiscal_documents::Column::WorkspaceId.eq(workspace_id));

        if let Some(kind) = filter.kind {
            let kind: crate::entities::sea_orm_active_enums::DocumentKind = kind.into();
            query = query.filter(fiscal_documents::Column::Kind.eq(kind));
        }
        if let Some(status) = filter.status {
            let status: DocumentStatus = status.into();
            query = query.filter(fiscal_documents::Column::Status.eq(status));
        }
        if let Some(contact_id) = filter.contact_id {
            query = query.filter(fiscal_documents::Column::ContactId.eq(contact_id));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(fiscal_documents::Column::IssueDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(fiscal_documents::Column::IssueDate.lte(to));
        }

        let total = query.clone().count(&self.db).await?;
        let documents = query
            .order_by_desc(fiscal_documents::Column::IssueDate)
            .order_by_desc(fiscal_documents::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(documents, page.page, page.per_page, total))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Resolves the document's number and subtype under the sequence row
    /// lock.
    ///
    /// With a candidate NCF: the subtype is looked up (and locked) by the
    /// candidate's prefix, and the candidate is validated against it -
    /// format, expiry, exhaustion, watermark, then global uniqueness across
    /// both document kinds, excluding `exclude_document` on the update
    /// path. Without a candidate: the named (or default) subtype is locked
    /// and its next number is allocated.
    ///
    /// The caller must persist the advance in the same transaction.
    async fn resolve_number(
        txn: &DatabaseTransaction,
        candidate: Option<&str>,
        subtype_id: Option<Uuid>,
        issue_date: NaiveDate,
        exclude_document: Option<Uuid>,
    ) -> Result<(document_subtypes::Model, i64, String), DocumentWriteError> {
        match candidate {
            Some(candidate) => {
                let (prefix, number) = split_ncf(candidate)?;

                let subtype = SequenceRepository::lock_by_prefix(txn, prefix)
                    .await?
                    .ok_or_else(|| SequenceError::PrefixNotFound(prefix.to_string()))?;
                if let Some(supplied) = subtype_id {
                    if supplied != subtype.id {
                        return Err(DocumentWriteError::SubtypeMismatch {
                            supplied,
                            prefix: prefix.to_string(),
                        });
                    }
                }

                let canonical = format_ncf(&subtype.prefix, number);
                let mut duplicates = fiscal_documents::Entity::find()
                    .filter(fiscal_documents::Column::DocumentNumber.eq(canonical.clone()));
                if let Some(exclude) = exclude_document {
                    duplicates = duplicates.filter(fiscal_documents::Column::Id.ne(exclude));
                }
                let taken = duplicates.count(txn).await? > 0;

                let snapshot = subtype_snapshot(&subtype);
                let validated = validate_candidate(
                    candidate,
                    issue_date,
                    |p| (p == snapshot.prefix).then(|| snapshot.clone()),
                    |_| taken,
                )?;

                Ok((subtype, validated.number, validated.canonical))
            }
            None => {
                let subtype_id = match subtype_id {
                    Some(id) => id,
                    None => {
                        document_subtypes::Entity::find()
                            .filter(document_subtypes::Column::IsDefault.eq(true))
                            .one(txn)
                            .await?
                            .ok_or(DocumentWriteError::NoDefaultSubtype)?
                            .id
                    }
                };
                let subtype = SequenceRepository::lock_by_id(txn, subtype_id)
                    .await?
                    .ok_or(DocumentWriteError::SubtypeNotFound(subtype_id))?;
                let (canonical, number) = SequenceRepository::peek_allocation(&subtype, issue_date)?;
                Ok((subtype, number, canonical))
            }
        }
    }

    /// The reconciler: routes every diffed line through its
    /// create/update/delete path.
    async fn reconcile_items(
        txn: &DatabaseTransaction,
        document: &fiscal_documents::Model,
        kind: CoreKind,
        submitted: &[SubmittedItem],
    ) -> Result<(), DocumentWriteError> {
        let rows = Self::load_items(txn, document.id).await?;
        let existing: Vec<ExistingItem> = rows.iter().map(existing_from_row).collect();
        let diff = diff_items(&existing, submitted)?;

        for removed in &diff.removed {
            let row = rows
                .iter()
                .find(|row| row.id == removed.id.into_inner())
                .ok_or_else(|| DocumentError::UnknownItem(removed.id))?;
            Self::remove_item_with_stock(txn, document, row).await?;
        }

        for update in &diff.updated {
            let row = rows
                .iter()
                .find(|row| row.id == update.id.into_inner())
                .ok_or_else(|| DocumentError::UnknownItem(update.id))?;
            let amounts = line_amounts(&update.input)?;

            if kind == CoreKind::Invoice {
                let product = Self::require_product(txn, update.input.product_id.into_inner())
                    .await?;
                if product.track_stock {
                    Self::reconcile_tracked_update(
                        txn,
                        document,
                        row,
                        update.old_quantity,
                        update.input.quantity,
                    )
                    .await?;
                }
            }

            let mut active: document_items::ActiveModel = row.clone().into();
            active.quantity = Set(update.input.quantity);
            active.unit_price = Set(update.input.unit_price);
            active.discount_rate = Set(update.input.discount_rate.unwrap_or(Decimal::ZERO));
            active.discount_amount = Set(amounts.discount);
            active.tax_rate = Set(update.input.tax_rate.unwrap_or(Decimal::ZERO));
            active.tax_amount = Set(amounts.tax);
            active.total = Set(amounts.total);
            active.update(txn).await?;
        }

        for created in &diff.created {
            let amounts = line_amounts(created)?;
            Self::insert_item_with_stock(txn, document, created, amounts).await?;
        }

        Ok(())
    }

    /// Update-path ledger work for a stock-tracked invoice line.
    ///
    /// With the SALE movement present: apply the quantity delta to the
    /// balance and update the movement in place. A missing movement is an
    /// invariant breach; it is logged and repaired by consuming the full
    /// new quantity and recreating the movement.
    async fn reconcile_tracked_update(
        txn: &DatabaseTransaction,
        document: &fiscal_documents::Model,
        row: &document_items::Model,
        old_quantity: Decimal,
        new_quantity: Decimal,
    ) -> Result<(), DocumentWriteError> {
        match Self::find_sale_movement(txn, row.id).await? {
            Some(movement) => {
                match reconcile_item_change(old_quantity, new_quantity)
                    .map_err(StockLedgerError::Ledger)?
                {
                    StockDelta::Consume(delta) => {
                        StockRepository::decrement_locked(
                            txn,
                            row.product_id,
                            document.workspace_id,
                            delta,
                        )
                        .await?;
                    }
                    StockDelta::Release(delta) => {
                        StockRepository::increment_locked(
                            txn,
                            row.product_id,
                            document.workspace_id,
                            delta,
                        )
                        .await?;
                    }
                    StockDelta::None => {}
                }

                let mut active: stock_movements::ActiveModel = movement.into();
                active.quantity = Set(sale_movement_quantity(new_quantity));
                active.update(txn).await?;

                info!(
                    document_item_id = %row.id,
                    product_id = %row.product_id,
                    old_quantity = %old_quantity,
                    new_quantity = %new_quantity,
                    "line item reconciled"
                );
            }
            None => {
                error!(
                    document_item_id = %row.id,
                    product_id = %row.product_id,
                    "SALE movement missing during reconciliation; recreating"
                );
                StockRepository::decrement_locked(
                    txn,
                    row.product_id,
                    document.workspace_id,
                    new_quantity,
                )
                .await?;
                StockRepository::record_movement(
                    txn,
                    MovementRecord {
                        product_id: row.product_id,
                        workspace_id: document.workspace_id,
                        document_item_id: Some(row.id),
                        movement_type: MovementType::Sale,
                        quantity: sale_movement_quantity(new_quantity),
                        reference_number: Some(document.document_number.clone()),
                        note: None,
                        from_workspace_id: None,
                        to_workspace_id: None,
                    },
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Create-path for one line: insert the row and, for stock-tracked
    /// invoice lines, decrement the balance and record the SALE movement.
    async fn insert_item_with_stock(
        txn: &DatabaseTransaction,
        document: &fiscal_documents::Model,
        input: &DocumentItemInput,
        amounts: LineAmounts,
    ) -> Result<document_items::Model, DocumentWriteError> {
        let product = Self::require_product(txn, input.product_id.into_inner()).await?;
        let kind: CoreKind = document.kind.clone().into();
        let move_stock = kind == CoreKind::Invoice && product.track_stock;

        if move_stock {
            let level = StockRepository::decrement_locked(
                txn,
                product.id,
                document.workspace_id,
                input.quantity,
            )
            .await?;
            info!(
                product_id = %product.id,
                workspace_id = %document.workspace_id,
                quantity = %input.quantity,
                balance = %level.quantity,
                "stock consumed by line item"
            );
        }

        let now = Utc::now().into();
        let item = document_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            document_id: Set(document.id),
            product_id: Set(product.id),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
            discount_rate: Set(input.discount_rate.unwrap_or(Decimal::ZERO)),
            discount_amount: Set(amounts.discount),
            tax_rate: Set(input.tax_rate.unwrap_or(Decimal::ZERO)),
            tax_amount: Set(amounts.tax),
            total: Set(amounts.total),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(txn)
        .await?;

        if move_stock {
            StockRepository::record_movement(
                txn,
                MovementRecord {
                    product_id: product.id,
                    workspace_id: document.workspace_id,
                    document_item_id: Some(item.id),
                    movement_type: MovementType::Sale,
                    quantity: sale_movement_quantity(input.quantity),
                    reference_number: Some(document.document_number.clone()),
                    note: None,
                    from_workspace_id: None,
                    to_workspace_id: None,
                },
            )
            .await?;
        }

        Ok(item)
    }

    /// Delete-path for one line: return the stock, drop the SALE movement,
    /// drop the row.
    async fn remove_item_with_stock(
        txn: &DatabaseTransaction,
        document: &fiscal_documents::Model,
        row: &document_items::Model,
    ) -> Result<(), DocumentWriteError> {
        if let Some(movement) = Self::find_sale_movement(txn, row.id).await? {
            StockRepository::increment_locked(
                txn,
                row.product_id,
                document.workspace_id,
                row.quantity,
            )
            .await?;
            movement.delete(txn).await?;
            info!(
                document_item_id = %row.id,
                product_id = %row.product_id,
                quantity = %row.quantity,
                "stock returned by removed line item"
            );
        }

        row.clone().delete(txn).await?;
        Ok(())
    }

    async fn find_sale_movement(
        txn: &DatabaseTransaction,
        document_item_id: Uuid,
    ) -> Result<Option<stock_movements::Model>, DbErr> {
        stock_movements::Entity::find()
            .filter(stock_movements::Column::DocumentItemId.eq(document_item_id))
            .filter(stock_movements::Column::MovementType.eq(MovementType::Sale))
            .one(txn)
            .await
    }

    async fn load_items(
        txn: &DatabaseTransaction,
        document_id: Uuid,
    ) -> Result<Vec<document_items::Model>, DbErr> {
        document_items::Entity::find()
            .filter(document_items::Column::DocumentId.eq(document_id))
            .order_by_asc(document_items::Column::CreatedAt)
            .all(txn)
            .await
    }

    async fn require_workspace(
        txn: &DatabaseTransaction,
        workspace_id: Uuid,
    ) -> Result<workspaces::Model, DocumentWriteError> {
        workspaces::Entity::find_by_id(workspace_id)
            .one(txn)
            .await?
            .ok_or(DocumentWriteError::WorkspaceNotFound(workspace_id))
    }

    async fn require_contact(
        txn: &DatabaseTransaction,
        workspace_id: Uuid,
        contact_id: Uuid,
    ) -> Result<contacts::Model, DocumentWriteError> {
        contacts::Entity::find_by_id(contact_id)
            .filter(contacts::Column::WorkspaceId.eq(workspace_id))
            .one(txn)
            .await?
            .ok_or(DocumentWriteError::ContactNotFound(contact_id))
    }

    async fn require_product(
        txn: &DatabaseTransaction,
        product_id: Uuid,
    ) -> Result<products::Model, DocumentWriteError> {
        products::Entity::find_by_id(product_id)
            .one(txn)
            .await?
            .ok_or(DocumentWriteError::ProductNotFound(product_id))
    }
}

/// Statuses a caller may assign directly; converted and deleted only ever
/// come from the convert/delete operations.
fn validate_assignable_status(
    status: CoreStatus,
    kind: CoreKind,
    action: &'static str,
) -> Result<(), DocumentError> {
    if matches!(status, CoreStatus::Converted | CoreStatus::Deleted) {
        return Err(DocumentError::InvalidStatus { status, action });
    }
    if !status.allowed_for(kind) {
        return Err(DocumentError::StatusNotAllowedForKind { status, kind });
    }
    Ok(())
}

fn compute_lines(
    items: &[DocumentItemInput],
) -> Result<Vec<(DocumentItemInput, LineAmounts)>, DocumentError> {
    items
        .iter()
        .map(|item| Ok((item.clone(), line_amounts(item)?)))
        .collect()
}

fn existing_from_row(row: &document_items::Model) -> ExistingItem {
    ExistingItem {
        id: DocumentItemId::from_uuid(row.id),
        product_id: ProductId::from_uuid(row.product_id),
        quantity: row.quantity,
        unit_price: row.unit_price,
        discount_amount: row.discount_amount,
        tax_amount: row.tax_amount,
    }
}

fn input_from_row(row: &document_items::Model) -> DocumentItemInput {
    DocumentItemInput {
        product_id: ProductId::from_uuid(row.product_id),
        quantity: row.quantity,
        unit_price: row.unit_price,
        discount_rate: Some(row.discount_rate),
        discount_amount: Some(row.discount_amount),
        tax_rate: Some(row.tax_rate),
        tax_amount: Some(row.tax_amount),
    }
}

/// Recomputes document totals from persisted item rows.
fn totals_from_rows(rows: &[document_items::Model]) -> DocumentTotals {
    rows.iter().fold(DocumentTotals::default(), |acc, row| {
        let subtotal = row.quantity * row.unit_price;
        DocumentTotals {
            subtotal_amount: acc.subtotal_amount + subtotal,
            discount_amount: acc.discount_amount + row.discount_amount,
            tax_amount: acc.tax_amount + row.tax_amount,
            total_amount: acc.total_amount + row.total,
        }
    })
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
