//! Identity-keyed line-item diffing for the document update path.
//!
//! The update contract: items present in both the existing and submitted
//! sets are routed through the reconciler's update path, items only in the
//! old set are removed, items only in the new set are created. An item whose
//! fields are untouched produces no work at all.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use facturo_shared::types::{DocumentItemId, ProductId};

use super::error::DocumentError;
use super::types::{DocumentItemInput, SubmittedItem};

/// The fields of an existing line item relevant to diffing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingItem {
    /// Line item ID.
    pub id: DocumentItemId,
    /// Product on the line.
    pub product_id: ProductId,
    /// Current quantity.
    pub quantity: Decimal,
    /// Current unit price.
    pub unit_price: Decimal,
    /// Current discount amount.
    pub discount_amount: Decimal,
    /// Current tax amount.
    pub tax_amount: Decimal,
}

/// An in-place update of one line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUpdate {
    /// The line item being edited.
    pub id: DocumentItemId,
    /// Quantity before the edit (drives the stock delta).
    pub old_quantity: Decimal,
    /// The new field values.
    pub input: DocumentItemInput,
}

/// The work a document update implies on its line items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDiff {
    /// Lines to create (submitted without an ID).
    pub created: Vec<DocumentItemInput>,
    /// Lines to edit in place.
    pub updated: Vec<ItemUpdate>,
    /// Lines to remove (present before, absent from the submission).
    pub removed: Vec<ExistingItem>,
}

/// Diffs a document's existing items against a submitted item set.
///
/// A submitted item with an ID must match an existing line; a product change
/// on an existing line is treated as remove + create, since the SALE
/// movement belongs to the product.
pub fn diff_items(
    existing: &[ExistingItem],
    submitted: &[SubmittedItem],
) -> Result<ItemDiff, DocumentError> {
    if submitted.is_empty() {
        return Err(DocumentError::EmptyItems);
    }
    for item in submitted {
        item.input.validate()?;
    }

    let by_id: BTreeMap<_, _> = existing.iter().map(|item| (item.id.0, item)).collect();

    let mut seen = BTreeSet::new();
    let mut diff = ItemDiff::default();

    for item in submitted {
        let Some(id) = item.id else {
            diff.created.push(item.input.clone());
            continue;
        };

        let current = *by_id.get(&id.0).ok_or(DocumentError::UnknownItem(id))?;
        if !seen.insert(id.0) {
            return Err(DocumentError::DuplicateItem(id));
        }

        if current.product_id != item.input.product_id {
            // The movement is product-bound; swap means remove + create.
            diff.removed.push(current.clone());
            diff.created.push(item.input.clone());
            continue;
        }

        if item_changed(current, &item.input) {
            diff.updated.push(ItemUpdate {
                id,
                old_quantity: current.quantity,
                input: item.input.clone(),
            });
        }
    }

    for item in existing {
        if !seen.contains(&item.id.0) {
            // Could already be in `removed` from a product swap.
            if !diff.removed.iter().any(|removed| removed.id == item.id) {
                diff.removed.push(item.clone());
            }
        }
    }

    Ok(diff)
}

fn item_changed(current: &ExistingItem, input: &DocumentItemInput) -> bool {
    current.quantity != input.quantity
        || current.unit_price != input.unit_price
        || input
            .discount_amount
            .is_some_and(|amount| amount != current.discount_amount)
        || input
            .tax_amount
            .is_some_and(|amount| amount != current.tax_amount)
        || input.discount_rate.is_some()
        || input.tax_rate.is_some()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn existing(quantity: Decimal) -> ExistingItem {
        ExistingItem {
            id: DocumentItemId::new(),
            product_id: ProductId::new(),
            quantity,
            unit_price: dec!(100),
            discount_amount: dec!(0),
            tax_amount: dec!(0),
        }
    }

    fn resubmit(item: &ExistingItem, quantity: Decimal) -> SubmittedItem {
        SubmittedItem {
            id: Some(item.id),
            input: DocumentItemInput {
                product_id: item.product_id,
                quantity,
                unit_price: item.unit_price,
                discount_rate: None,
                discount_amount: None,
                tax_rate: None,
                tax_amount: None,
            },
        }
    }

    #[test]
    fn unchanged_items_produce_no_work() {
        let item = existing(dec!(3));
        let diff = diff_items(&[item.clone()], &[resubmit(&item, dec!(3))]).unwrap();
        assert_eq!(diff, ItemDiff::default());
    }

    #[test]
    fn quantity_change_routes_to_update() {
        let item = existing(dec!(3));
        let diff = diff_items(&[item.clone()], &[resubmit(&item, dec!(7))]).unwrap();
        assert!(diff.created.is_empty());
        assert!(diff.removed.is_empty());
        assert_eq!(diff.updated.len(), 1);
        assert_eq!(diff.updated[0].old_quantity, dec!(3));
        assert_eq!(diff.updated[0].input.quantity, dec!(7));
    }

    #[test]
    fn missing_items_are_removed_and_new_items_created() {
        let keep = existing(dec!(3));
        let drop = existing(dec!(2));
        let new_line = SubmittedItem {
            id: None,
            input: DocumentItemInput {
                product_id: ProductId::new(),
                quantity: dec!(1),
                unit_price: dec!(50),
                discount_rate: None,
                discount_amount: None,
                tax_rate: None,
                tax_amount: None,
            },
        };

        let diff = diff_items(
            &[keep.clone(), drop.clone()],
            &[resubmit(&keep, dec!(3)), new_line],
        )
        .unwrap();
        assert_eq!(diff.created.len(), 1);
        assert!(diff.updated.is_empty());
        assert_eq!(diff.removed, vec![drop]);
    }

    #[test]
    fn product_swap_is_remove_plus_create() {
        let item = existing(dec!(3));
        let mut swapped = resubmit(&item, dec!(3));
        swapped.input.product_id = ProductId::new();

        let diff = diff_items(&[item.clone()], &[swapped]).unwrap();
        assert_eq!(diff.removed, vec![item]);
        assert_eq!(diff.created.len(), 1);
        assert!(diff.updated.is_empty());
    }

    #[test]
    fn unknown_and_duplicate_ids_are_rejected() {
        let item = existing(dec!(3));
        let stranger = SubmittedItem {
            id: Some(DocumentItemId::new()),
            input: resubmit(&item, dec!(3)).input,
        };
        assert!(matches!(
            diff_items(&[item.clone()], &[stranger]),
            Err(DocumentError::UnknownItem(_))
        ));

        let twice = resubmit(&item, dec!(3));
        assert!(matches!(
            diff_items(&[item.clone()], &[twice.clone(), twice]),
            Err(DocumentError::DuplicateItem(_))
        ));
    }

    #[test]
    fn empty_submission_is_rejected() {
        assert!(matches!(
            diff_items(&[existing(dec!(1))], &[]),
            Err(DocumentError::EmptyItems)
        ));
    }
}
