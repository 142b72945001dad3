//! Receipt models for uploaded OCR text and per-run extraction results.
//!
//! Receipts are created when the upstream OCR service saves its text output
//! and are annotated in place once an analysis run has consumed them.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single uploaded receipt for one family member.
///
/// The raw OCR text is kept verbatim; extraction results are attached when
/// the receipt is marked processed. Receipts are never deleted by the
/// pipeline (retention is handled elsewhere).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRecord {
    /// Unique identifier for this receipt.
    pub id: String,
    /// Family that owns the receipt and its shopping list.
    pub family_id: String,
    /// Email of the uploading user.
    pub user_email: String,
    /// Raw OCR text as produced upstream.
    pub raw_text: String,
    /// Reference to the uploaded source blob, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_blob: Option<String>,
    /// Whether an analysis run has consumed this receipt.
    pub processed: bool,
    /// Primary store name attached at processing time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    /// Per-store items attached at processing time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub store_items: BTreeMap<String, Vec<String>>,
    /// Purchase date recovered from the receipt, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    /// When the receipt text was uploaded.
    pub upload_date: DateTime<Utc>,
}

impl ReceiptRecord {
    /// Create a new unprocessed receipt.
    pub fn new(
        family_id: impl Into<String>,
        user_email: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            family_id: family_id.into(),
            user_email: user_email.into(),
            raw_text: raw_text.into(),
            source_blob: None,
            processed: false,
            store_name: None,
            store_items: BTreeMap::new(),
            purchase_date: None,
            upload_date: Utc::now(),
        }
    }

    /// Attach the source blob reference.
    pub fn with_source_blob(mut self, blob: impl Into<String>) -> Self {
        self.source_blob = Some(blob.into());
        self
    }

    /// Mark the receipt consumed and attach extraction results.
    pub fn mark_processed(
        &mut self,
        store_name: Option<String>,
        store_items: BTreeMap<String, Vec<String>>,
    ) {
        self.processed = true;
        self.store_name = store_name;
        self.store_items = store_items;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_receipt_is_unprocessed() {
        let receipt = ReceiptRecord::new("fam-1", "a@example.com", "MILK 4.49");
        assert!(!receipt.processed);
        assert!(receipt.store_name.is_none());
        assert!(receipt.store_items.is_empty());
        assert!(!receipt.id.is_empty());
    }

    #[test]
    fn mark_processed_attaches_extraction() {
        let mut receipt = ReceiptRecord::new("fam-1", "a@example.com", "MILK 4.49");
        let mut items = BTreeMap::new();
        items.insert("Kroger".to_string(), vec!["Milk".to_string()]);
        receipt.mark_processed(Some("Kroger".to_string()), items);
        assert!(receipt.processed);
        assert_eq!(receipt.store_name.as_deref(), Some("Kroger"));
        assert_eq!(receipt.store_items["Kroger"], vec!["Milk"]);
    }
}
