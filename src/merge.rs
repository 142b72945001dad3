//! Folding newly extracted items into a family shopping list.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::models::{ShoppingList, StoreBundle};
use crate::stores;

/// Merge one run's extraction into an existing list.
///
/// Produces a new list carrying over the identifier, owner, and creation
/// timestamp. Store names are normalized before use as keys; a name that
/// fuzzily matches an existing key folds into that key instead of opening a
/// near-duplicate bucket, with an exact normalized match taking precedence
/// over a fuzzy one. Items already present under a store
/// (case-insensitively) are skipped, so the merge never duplicates and
/// never removes.
pub fn merge(existing: &ShoppingList, extracted: &BTreeMap<String, StoreBundle>) -> ShoppingList {
    let mut merged = existing.clone();

    for (raw_store, bundle) in extracted {
        let normalized = stores::normalize(raw_store);

        let key = if merged.store_items.contains_key(&normalized) {
            normalized
        } else {
            merged
                .store_items
                .keys()
                .find(|existing_key| stores::are_similar(existing_key, &normalized))
                .cloned()
                .unwrap_or(normalized)
        };

        let items = merged.store_items.entry(key).or_default();
        for item in &bundle.items {
            let duplicate = items
                .iter()
                .any(|present| present.to_lowercase() == item.to_lowercase());
            if !duplicate {
                items.push(item.clone());
            }
        }
    }

    merged.last_updated = Utc::now();
    merged
}
