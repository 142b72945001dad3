//! The cumulative family shopping list.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One logical shopping list per family, keyed by normalized store name.
///
/// Item names are unique per store under case-insensitive comparison and
/// keep their order of first appearance. The list is created lazily on the
/// first analysis run and only ever grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    /// List identifier (same as the family id).
    pub id: String,
    /// Owning family.
    pub family_id: String,
    /// Normalized store name to its accumulated items.
    #[serde(default)]
    pub store_items: BTreeMap<String, Vec<String>>,
    /// When the list was first created.
    pub created_at: DateTime<Utc>,
    /// When the list was last merged into.
    pub last_updated: DateTime<Utc>,
}

impl ShoppingList {
    /// Create an empty list for a family.
    pub fn new(family_id: impl Into<String>) -> Self {
        let family_id = family_id.into();
        let now = Utc::now();
        Self {
            id: family_id.clone(),
            family_id,
            store_items: BTreeMap::new(),
            created_at: now,
            last_updated: now,
        }
    }

    /// Total number of items across all stores.
    pub fn total_items(&self) -> usize {
        self.store_items.values().map(Vec::len).sum()
    }

    /// Whether an item is already present under a store, case-insensitively.
    pub fn contains_item(&self, store: &str, item: &str) -> bool {
        self.store_items
            .get(store)
            .map(|items| {
                items
                    .iter()
                    .any(|i| i.to_lowercase() == item.to_lowercase())
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_id_matches_family() {
        let list = ShoppingList::new("fam-9");
        assert_eq!(list.id, "fam-9");
        assert_eq!(list.family_id, "fam-9");
        assert_eq!(list.total_items(), 0);
    }

    #[test]
    fn contains_item_ignores_case() {
        let mut list = ShoppingList::new("fam-9");
        list.store_items
            .insert("Kroger".to_string(), vec!["Whole Milk".to_string()]);
        assert!(list.contains_item("Kroger", "whole milk"));
        assert!(!list.contains_item("Kroger", "eggs"));
        assert!(!list.contains_item("Walmart", "whole milk"));
    }
}
