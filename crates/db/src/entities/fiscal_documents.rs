//! `SeaORM` Entity for the fiscal_documents table.
//!
//! One table carries both invoices and quotations, discriminated by `kind`.
//! `document_number` is globally unique across both kinds - the NCF
//! namespace is shared.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DocumentKind, DocumentStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "fiscal_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: DocumentKind,
    pub workspace_id: Uuid,
    pub contact_id: Uuid,
    pub document_subtype_id: Uuid,
    #[sea_orm(unique)]
    pub document_number: String,
    pub issue_date: Date,
    pub due_date: Option<Date>,
    pub status: DocumentStatus,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub subtotal_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub discount_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub tax_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    pub notes: Option<String>,
    /// For converted quotations: the invoice that was derived from them.
    pub converted_document_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workspaces::Entity",
        from = "Column::WorkspaceId",
        to = "super::workspaces::Column::Id"
    )]
    Workspaces,
    #[sea_orm(
        belongs_to = "super::contacts::Entity",
        from = "Column::ContactId",
        to = "super::contacts::Column::Id"
    )]
    Contacts,
    #[sea_orm(
        belongs_to = "super::document_subtypes::Entity",
        from = "Column::DocumentSubtypeId",
        to = "super::document_subtypes::Column::Id"
    )]
    DocumentSubtypes,
    #[sea_orm(has_many = "super::document_items::Entity")]
    DocumentItems,
}

impl Related<super::workspaces::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workspaces.def()
    }
}

impl Related<super::contacts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contacts.def()
    }
}

impl Related<super::document_subtypes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentSubtypes.def()
    }
}

impl Related<super::document_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
