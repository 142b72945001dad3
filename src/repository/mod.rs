//! Repository seams for receipt and shopping list persistence.
//!
//! Durable storage is owned by an external document store; the pipeline
//! only depends on these traits. The in-memory implementations back tests
//! and one-shot CLI runs.

mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ReceiptRecord, ShoppingList};

pub use memory::{MemoryReceiptRepository, MemoryShoppingListRepository};

/// Errors surfaced by a storage backend.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Record not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Storage for uploaded receipts.
#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    /// Insert or update a receipt.
    async fn save(&self, receipt: &ReceiptRecord) -> Result<()>;

    /// Fetch a receipt by id.
    async fn get(&self, id: &str) -> Result<Option<ReceiptRecord>>;

    /// All receipts for a family not yet consumed by an analysis run.
    async fn unprocessed_for_family(&self, family_id: &str) -> Result<Vec<ReceiptRecord>>;
}

/// Storage for family shopping lists.
#[async_trait]
pub trait ShoppingListRepository: Send + Sync {
    /// Fetch the list for a family, if one exists yet.
    async fn get(&self, family_id: &str) -> Result<Option<ShoppingList>>;

    /// Insert or replace the list.
    async fn save(&self, list: &ShoppingList) -> Result<()>;
}
