//! `SeaORM` Entity for the stock_movements table.
//!
//! Append-only audit ledger of signed quantity changes. The one exception is
//! the reconciliation path, which updates a SALE movement's quantity in
//! place when its line item's quantity changes, keeping a strict 1:1 mapping
//! between active SALE movements and current line items.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::MovementType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub workspace_id: Uuid,
    /// Set exactly for SALE movements: the line item that owns this entry.
    pub document_item_id: Option<Uuid>,
    pub movement_type: MovementType,
    /// Signed quantity; negative is outgoing.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    pub reference_number: Option<String>,
    pub note: Option<String>,
    pub from_workspace_id: Option<Uuid>,
    pub to_workspace_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Products,
    #[sea_orm(
        belongs_to = "super::document_items::Entity",
        from = "Column::DocumentItemId",
        to = "super::document_items::Column::Id"
    )]
    DocumentItems,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::document_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
