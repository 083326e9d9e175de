//! `SeaORM` entity definitions.

pub mod contacts;
pub mod document_items;
pub mod document_subtypes;
pub mod fiscal_documents;
pub mod product_stock;
pub mod products;
pub mod sea_orm_active_enums;
pub mod stock_movements;
pub mod workspaces;
