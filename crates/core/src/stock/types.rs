//! Stock movement and adjustment classifications.

use serde::{Deserialize, Serialize};

/// Classification of a stock movement ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Opening balance set by configuration.
    Initial,
    /// Consumption by a document line item. Exactly one SALE movement exists
    /// per stock-tracked line item; quantity edits update it in place.
    Sale,
    /// Manual correction (set/add/remove).
    Adjustment,
    /// Stock moved between two workspaces.
    Transfer,
}

/// How a stock adjustment interprets its quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
    /// Set the balance to the given quantity; the delta is computed against
    /// the current balance.
    SetQuantity,
    /// Add the given quantity to the balance.
    AddQuantity,
    /// Remove the given quantity from the balance.
    RemoveQuantity,
}

impl MovementType {
    /// Stable string form used in the database and API payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Sale => "sale",
            Self::Adjustment => "adjustment",
            Self::Transfer => "transfer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&MovementType::Sale).unwrap(),
            "\"sale\""
        );
        assert_eq!(MovementType::Initial.as_str(), "initial");
    }

    #[test]
    fn adjustment_type_round_trips() {
        let parsed: AdjustmentType = serde_json::from_str("\"set_quantity\"").unwrap();
        assert_eq!(parsed, AdjustmentType::SetQuantity);
    }
}
