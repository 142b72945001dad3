//! In-memory repositories for tests and one-shot CLI runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{ReceiptRecord, ShoppingList};

use super::{ReceiptRepository, Result, ShoppingListRepository};

/// Receipt storage backed by a map.
#[derive(Default)]
pub struct MemoryReceiptRepository {
    receipts: RwLock<HashMap<String, ReceiptRecord>>,
}

impl MemoryReceiptRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReceiptRepository for MemoryReceiptRepository {
    async fn save(&self, receipt: &ReceiptRecord) -> Result<()> {
        self.receipts
            .write()
            .await
            .insert(receipt.id.clone(), receipt.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ReceiptRecord>> {
        Ok(self.receipts.read().await.get(id).cloned())
    }

    async fn unprocessed_for_family(&self, family_id: &str) -> Result<Vec<ReceiptRecord>> {
        Ok(self
            .receipts
            .read()
            .await
            .values()
            .filter(|r| r.family_id == family_id && !r.processed)
            .cloned()
            .collect())
    }
}

/// Shopping list storage backed by a map.
#[derive(Default)]
pub struct MemoryShoppingListRepository {
    lists: RwLock<HashMap<String, ShoppingList>>,
}

impl MemoryShoppingListRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShoppingListRepository for MemoryShoppingListRepository {
    async fn get(&self, family_id: &str) -> Result<Option<ShoppingList>> {
        Ok(self.lists.read().await.get(family_id).cloned())
    }

    async fn save(&self, list: &ShoppingList) -> Result<()> {
        self.lists
            .write()
            .await
            .insert(list.family_id.clone(), list.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unprocessed_filter_excludes_processed_and_other_families() {
        let repo = MemoryReceiptRepository::new();

        let fresh = ReceiptRecord::new("fam-1", "a@b.c", "text");
        let mut done = ReceiptRecord::new("fam-1", "a@b.c", "text");
        done.mark_processed(None, Default::default());
        let other = ReceiptRecord::new("fam-2", "a@b.c", "text");

        for receipt in [&fresh, &done, &other] {
            repo.save(receipt).await.unwrap();
        }

        let unprocessed = repo.unprocessed_for_family("fam-1").await.unwrap();
        assert_eq!(unprocessed.len(), 1);
        assert_eq!(unprocessed[0].id, fresh.id);
    }

    #[tokio::test]
    async fn list_save_is_an_upsert() {
        let repo = MemoryShoppingListRepository::new();
        assert!(repo.get("fam-1").await.unwrap().is_none());

        let mut list = ShoppingList::new("fam-1");
        repo.save(&list).await.unwrap();

        list.store_items
            .insert("Kroger".to_string(), vec!["Milk".to_string()]);
        repo.save(&list).await.unwrap();

        let stored = repo.get("fam-1").await.unwrap().unwrap();
        assert_eq!(stored.store_items["Kroger"], vec!["Milk"]);
    }
}
