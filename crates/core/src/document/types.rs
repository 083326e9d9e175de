//! Document kinds, statuses, and line-item input.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use facturo_shared::types::{DocumentItemId, ProductId};

use super::error::DocumentError;

/// The two fiscal document kinds. Both share one table, one numbering
/// namespace, and one line-item model; only quotations can be converted and
/// only invoices can be paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// A fiscal invoice.
    Invoice,
    /// A quotation; moves no stock until converted.
    Quotation,
}

impl DocumentKind {
    /// Stable string form used in the database and API payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Quotation => "quotation",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Being drafted; fully editable.
    Draft,
    /// Issued, awaiting payment or acceptance; still editable.
    Pending,
    /// Paid in full (invoices only).
    Paid,
    /// Cancelled; immutable.
    Cancelled,
    /// Converted into an invoice (quotations only); immutable.
    Converted,
    /// Soft-deleted; stock returned, row preserved for audit.
    Deleted,
}

impl DocumentStatus {
    /// Returns true if the document can still be modified.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Pending)
    }

    /// Returns true if the status is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Converted | Self::Deleted)
    }

    /// Returns true if this status is valid for the given kind.
    #[must_use]
    pub fn allowed_for(&self, kind: DocumentKind) -> bool {
        match self {
            Self::Paid => kind == DocumentKind::Invoice,
            Self::Converted => kind == DocumentKind::Quotation,
            _ => true,
        }
    }

    /// Stable string form used in the database and API payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Converted => "converted",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied line item.
///
/// Discount and tax may arrive as a rate (percentage), an amount, or both;
/// amounts win when present, rates fill in missing amounts, and the line
/// total is always recomputed server-side from these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentItemInput {
    /// Product being sold.
    pub product_id: ProductId,
    /// Quantity; must be positive.
    pub quantity: Decimal,
    /// Unit price at time of issue.
    pub unit_price: Decimal,
    /// Discount percentage (0..=100).
    #[serde(default)]
    pub discount_rate: Option<Decimal>,
    /// Absolute discount amount; wins over `discount_rate`.
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
    /// Tax percentage (0..=100), e.g. the 18% ITBIS.
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    /// Absolute tax amount; wins over `tax_rate`.
    #[serde(default)]
    pub tax_amount: Option<Decimal>,
}

impl DocumentItemInput {
    /// Validates field-level constraints.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.quantity <= Decimal::ZERO {
            return Err(DocumentError::InvalidQuantity(self.quantity));
        }
        if self.unit_price < Decimal::ZERO {
            return Err(DocumentError::NegativeAmount { field: "unit_price" });
        }
        for (field, rate) in [
            ("discount_rate", self.discount_rate),
            ("tax_rate", self.tax_rate),
        ] {
            if let Some(rate) = rate {
                if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                    return Err(DocumentError::InvalidRate { field, rate });
                }
            }
        }
        for (field, amount) in [
            ("discount_amount", self.discount_amount),
            ("tax_amount", self.tax_amount),
        ] {
            if let Some(amount) = amount {
                if amount < Decimal::ZERO {
                    return Err(DocumentError::NegativeAmount { field });
                }
            }
        }
        Ok(())
    }
}

/// A line item as submitted on the update path: an `id` ties it to an
/// existing row, its absence marks a new line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedItem {
    /// Existing line item ID, if editing.
    #[serde(default)]
    pub id: Option<DocumentItemId>,
    /// The line's fields.
    #[serde(flatten)]
    pub input: DocumentItemInput,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn item(quantity: Decimal) -> DocumentItemInput {
        DocumentItemInput {
            product_id: ProductId::new(),
            quantity,
            unit_price: dec!(100),
            discount_rate: None,
            discount_amount: None,
            tax_rate: None,
            tax_amount: None,
        }
    }

    #[test]
    fn draft_and_pending_are_editable() {
        assert!(DocumentStatus::Draft.is_editable());
        assert!(DocumentStatus::Pending.is_editable());
        assert!(!DocumentStatus::Paid.is_editable());
        assert!(!DocumentStatus::Deleted.is_editable());
    }

    #[test]
    fn paid_is_invoice_only_converted_is_quotation_only() {
        assert!(DocumentStatus::Paid.allowed_for(DocumentKind::Invoice));
        assert!(!DocumentStatus::Paid.allowed_for(DocumentKind::Quotation));
        assert!(DocumentStatus::Converted.allowed_for(DocumentKind::Quotation));
        assert!(!DocumentStatus::Converted.allowed_for(DocumentKind::Invoice));
        assert!(DocumentStatus::Draft.allowed_for(DocumentKind::Invoice));
    }

    #[test]
    fn item_validation_rejects_bad_fields() {
        assert!(item(dec!(1)).validate().is_ok());
        assert!(item(dec!(0)).validate().is_err());
        assert!(item(dec!(-3)).validate().is_err());

        let mut negative_price = item(dec!(1));
        negative_price.unit_price = dec!(-1);
        assert!(negative_price.validate().is_err());

        let mut silly_rate = item(dec!(1));
        silly_rate.tax_rate = Some(dec!(250));
        assert!(matches!(
            silly_rate.validate(),
            Err(DocumentError::InvalidRate { field: "tax_rate", .. })
        ));
    }

    #[test]
    fn kind_and_status_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&DocumentKind::Quotation).unwrap(),
            "\"quotation\""
        );
        assert_eq!(
            serde_json::to_string(&DocumentStatus::Converted).unwrap(),
            "\"converted\""
        );
    }
}
