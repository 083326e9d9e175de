//! `SeaORM` active enums mapped to PostgreSQL enum types.
//!
//! Conversions to and from the pure `facturo-core` enums live here so the
//! repositories can hand core logic plain domain values.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use facturo_core::document::{DocumentKind as CoreKind, DocumentStatus as CoreStatus};
use facturo_core::stock::MovementType as CoreMovementType;

/// Fiscal document kind.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "document_kind")]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// A fiscal invoice.
    #[sea_orm(string_value = "invoice")]
    Invoice,
    /// A quotation.
    #[sea_orm(string_value = "quotation")]
    Quotation,
}

/// Fiscal document status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "document_status")]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Being drafted.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Issued, awaiting payment/acceptance.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Paid in full (invoices only).
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Cancelled.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    /// Converted into an invoice (quotations only).
    #[sea_orm(string_value = "converted")]
    Converted,
    /// Soft-deleted.
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

/// Stock movement classification.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "movement_type")]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Opening balance.
    #[sea_orm(string_value = "initial")]
    Initial,
    /// Consumption by a document line item.
    #[sea_orm(string_value = "sale")]
    Sale,
    /// Manual correction.
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
    /// Movement between workspaces.
    #[sea_orm(string_value = "transfer")]
    Transfer,
}

impl From<CoreKind> for DocumentKind {
    fn from(kind: CoreKind) -> Self {
        match kind {
            CoreKind::Invoice => Self::Invoice,
            CoreKind::Quotation => Self::Quotation,
        }
    }
}

impl From<DocumentKind> for CoreKind {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Invoice => Self::Invoice,
            DocumentKind::Quotation => Self::Quotation,
        }
    }
}

impl From<CoreStatus> for DocumentStatus {
    fn from(status: CoreStatus) -> Self {
        match status {
            CoreStatus::Draft => Self::Draft,
            CoreStatus::Pending => Self::Pending,
            CoreStatus::Paid => Self::Paid,
            CoreStatus::Cancelled => Self::Cancelled,
            CoreStatus::Converted => Self::Converted,
            CoreStatus::Deleted => Self::Deleted,
        }
    }
}

impl From<DocumentStatus> for CoreStatus {
    fn from(status: DocumentStatus) -> Self {
        match status {
            DocumentStatus::Draft => Self::Draft,
            DocumentStatus::Pending => Self::Pending,
            DocumentStatus::Paid => Self::Paid,
            DocumentStatus::Cancelled => Self::Cancelled,
            DocumentStatus::Converted => Self::Converted,
            DocumentStatus::Deleted => Self::Deleted,
        }
    }
}

impl From<CoreMovementType> for MovementType {
    fn from(movement_type: CoreMovementType) -> Self {
        match movement_type {
            CoreMovementType::Initial => Self::Initial,
            CoreMovementType::Sale => Self::Sale,
            CoreMovementType::Adjustment => Self::Adjustment,
            CoreMovementType::Transfer => Self::Transfer,
        }
    }
}

impl From<MovementType> for CoreMovementType {
    fn from(movement_type: MovementType) -> Self {
        match movement_type {
            MovementType::Initial => Self::Initial,
            MovementType::Sale => Self::Sale,
            MovementType::Adjustment => Self::Adjustment,
            MovementType::Transfer => Self::Transfer,
        }
    }
}
