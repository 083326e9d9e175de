//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ProductId` where a
//! `WorkspaceId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(WorkspaceId, "Unique identifier for a workspace (tenant scope).");
typed_id!(ContactId, "Unique identifier for a contact.");
typed_id!(ProductId, "Unique identifier for a product.");
typed_id!(
    DocumentSubtypeId,
    "Unique identifier for a fiscal document subtype sequence."
);
typed_id!(DocumentId, "Unique identifier for a fiscal document.");
typed_id!(DocumentItemId, "Unique identifier for a document line item.");
typed_id!(StockMovementId, "Unique identifier for a stock movement.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn new_ids_are_uuid_v7() {
        let id = DocumentId::new();
        assert_eq!(id.into_inner().get_version_num(), 7);
    }

    #[test]
    fn display_and_parse_round_trip() {
        let id = ProductId::new();
        let parsed = ProductId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn distinct_types_do_not_compare() {
        // Compile-time property; the types exist and are distinct wrappers.
        let w = WorkspaceId::new();
        let p = ProductId::from_uuid(w.into_inner());
        assert_eq!(w.into_inner(), p.into_inner());
    }
}
