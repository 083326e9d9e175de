//! `SeaORM` Entity for the document_subtypes table.
//!
//! A document subtype owns an NCF numbering sequence: a fixed 3-character
//! prefix plus a monotonically increasing counter bounded by
//! `[start_number, end_number]` and an optional validity date.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "document_subtypes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub prefix: String,
    pub start_number: i64,
    pub end_number: Option<i64>,
    /// The next number to allocate. Only ever increases; advanced under a
    /// row lock in the same transaction as the document write it guards.
    pub next_number: i64,
    pub valid_until_date: Option<Date>,
    /// At most one subtype is the default at any time.
    pub is_default: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fiscal_documents::Entity")]
    FiscalDocuments,
}

impl Related<super::fiscal_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FiscalDocuments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
