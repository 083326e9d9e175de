//! Initial database migration.
//!
//! Creates all core tables, enums, triggers, and indexes for the fiscal
//! document and stock subsystems.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TENANCY & MASTER DATA
        // ============================================================
        db.execute_unprepared(WORKSPACES_SQL).await?;
        db.execute_unprepared(CONTACTS_SQL).await?;
        db.execute_unprepared(PRODUCTS_SQL).await?;

        // ============================================================
        // PART 3: FISCAL NUMBERING
        // ============================================================
        db.execute_unprepared(DOCUMENT_SUBTYPES_SQL).await?;

        // ============================================================
        // PART 4: DOCUMENTS
        // ============================================================
        db.execute_unprepared(FISCAL_DOCUMENTS_SQL).await?;
        db.execute_unprepared(DOCUMENT_ITEMS_SQL).await?;

        // ============================================================
        // PART 5: STOCK
        // ============================================================
        db.execute_unprepared(PRODUCT_STOCK_SQL).await?;
        db.execute_unprepared(STOCK_MOVEMENTS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE document_kind AS ENUM ('invoice', 'quotation');

CREATE TYPE document_status AS ENUM (
    'draft', 'pending', 'paid', 'cancelled', 'converted', 'deleted'
);

CREATE TYPE movement_type AS ENUM ('initial', 'sale', 'adjustment', 'transfer');
";

const WORKSPACES_SQL: &str = r"
CREATE TABLE workspaces (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    address TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const CONTACTS_SQL: &str = r"
CREATE TABLE contacts (
    id UUID PRIMARY KEY,
    workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    rnc TEXT,
    email TEXT,
    phone TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_contacts_workspace ON contacts(workspace_id);
";

const PRODUCTS_SQL: &str = r"
CREATE TABLE products (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    sku TEXT NOT NULL UNIQUE,
    description TEXT,
    unit_price NUMERIC(19, 4) NOT NULL DEFAULT 0,
    track_stock BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const DOCUMENT_SUBTYPES_SQL: &str = r"
CREATE TABLE document_subtypes (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    prefix TEXT NOT NULL UNIQUE,
    start_number BIGINT NOT NULL,
    end_number BIGINT,
    next_number BIGINT NOT NULL,
    valid_until_date DATE,
    is_default BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_prefix_len CHECK (char_length(prefix) = 3),
    CONSTRAINT chk_start_positive CHECK (start_number >= 1),
    CONSTRAINT chk_next_in_range CHECK (next_number >= start_number),
    CONSTRAINT chk_end_after_start CHECK (end_number IS NULL OR end_number >= start_number)
);

-- At most one default subtype system-wide
CREATE UNIQUE INDEX uq_document_subtypes_default
    ON document_subtypes(is_default) WHERE is_default;
";

const FISCAL_DOCUMENTS_SQL: &str = r"
CREATE TABLE fiscal_documents (
    id UUID PRIMARY KEY,
    kind document_kind NOT NULL,
    workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE RESTRICT,
    contact_id UUID NOT NULL REFERENCES contacts(id) ON DELETE RESTRICT,
    document_subtype_id UUID NOT NULL REFERENCES document_subtypes(id) ON DELETE RESTRICT,
    document_number TEXT NOT NULL UNIQUE,
    issue_date DATE NOT NULL,
    due_date DATE,
    status document_status NOT NULL DEFAULT 'pending',
    subtotal_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    discount_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    notes TEXT,
    converted_document_id UUID REFERENCES fiscal_documents(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_fiscal_documents_workspace ON fiscal_documents(workspace_id);
CREATE INDEX idx_fiscal_documents_contact ON fiscal_documents(contact_id);
CREATE INDEX idx_fiscal_documents_kind_status ON fiscal_documents(kind, status);
CREATE INDEX idx_fiscal_documents_issue_date ON fiscal_documents(issue_date);
";

const DOCUMENT_ITEMS_SQL: &str = r"
CREATE TABLE document_items (
    id UUID PRIMARY KEY,
    document_id UUID NOT NULL REFERENCES fiscal_documents(id) ON DELETE CASCADE,
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE RESTRICT,
    quantity NUMERIC(19, 4) NOT NULL,
    unit_price NUMERIC(19, 4) NOT NULL,
    discount_rate NUMERIC(19, 4) NOT NULL DEFAULT 0,
    discount_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    tax_rate NUMERIC(19, 4) NOT NULL DEFAULT 0,
    tax_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_item_quantity_positive CHECK (quantity > 0)
);

CREATE INDEX idx_document_items_document ON document_items(document_id);
CREATE INDEX idx_document_items_product ON document_items(product_id);
";

const PRODUCT_STOCK_SQL: &str = r"
CREATE TABLE product_stock (
    id UUID PRIMARY KEY,
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
    quantity NUMERIC(19, 4) NOT NULL DEFAULT 0,
    minimum_quantity NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_product_stock UNIQUE (product_id, workspace_id),
    -- Backstop for the application-level guard: never negative
    CONSTRAINT chk_stock_non_negative CHECK (quantity >= 0)
);

CREATE INDEX idx_product_stock_workspace ON product_stock(workspace_id);
";

const STOCK_MOVEMENTS_SQL: &str = r"
CREATE TABLE stock_movements (
    id UUID PRIMARY KEY,
    product_id UUID NOT NULL REFERENCES products(id) ON DELETE RESTRICT,
    workspace_id UUID NOT NULL REFERENCES workspaces(id) ON DELETE RESTRICT,
    document_item_id UUID REFERENCES document_items(id) ON DELETE SET NULL,
    movement_type movement_type NOT NULL,
    quantity NUMERIC(19, 4) NOT NULL,
    reference_number TEXT,
    note TEXT,
    from_workspace_id UUID REFERENCES workspaces(id),
    to_workspace_id UUID REFERENCES workspaces(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_stock_movements_product_workspace
    ON stock_movements(product_id, workspace_id);
CREATE INDEX idx_stock_movements_created ON stock_movements(created_at);

-- Exactly one active SALE movement per line item
CREATE UNIQUE INDEX uq_stock_movements_sale_item
    ON stock_movements(document_item_id) WHERE movement_type = 'sale';
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: touch_updated_at
-- Keeps updated_at current on every row update
-- ============================================================
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at := NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_workspaces_touch
BEFORE UPDATE ON workspaces
FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_contacts_touch
BEFORE UPDATE ON contacts
FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_products_touch
BEFORE UPDATE ON products
FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_document_subtypes_touch
BEFORE UPDATE ON document_subtypes
FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_fiscal_documents_touch
BEFORE UPDATE ON fiscal_documents
FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_document_items_touch
BEFORE UPDATE ON document_items
FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_product_stock_touch
BEFORE UPDATE ON product_stock
FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

-- ============================================================
-- FUNCTION: prevent_counter_regression
-- next_number only ever increases
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_counter_regression()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.next_number < OLD.next_number THEN
        RAISE EXCEPTION 'next_number may not decrease (% -> %)',
            OLD.next_number, NEW.next_number;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_subtype_counter_monotonic
BEFORE UPDATE ON document_subtypes
FOR EACH ROW EXECUTE FUNCTION prevent_counter_regression();
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS stock_movements;
DROP TABLE IF EXISTS product_stock;
DROP TABLE IF EXISTS document_items;
DROP TABLE IF EXISTS fiscal_documents;
DROP TABLE IF EXISTS document_subtypes;
DROP TABLE IF EXISTS products;
DROP TABLE IF EXISTS contacts;
DROP TABLE IF EXISTS workspaces;
DROP FUNCTION IF EXISTS touch_updated_at;
DROP FUNCTION IF EXISTS prevent_counter_regression;
DROP TYPE IF EXISTS movement_type;
DROP TYPE IF EXISTS document_status;
DROP TYPE IF EXISTS document_kind;
";
