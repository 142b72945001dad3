//! Analysis orchestration: one pipeline run per trigger request.
//!
//! A run is strictly sequential from fetch through merge; only the three
//! finalize operations (persist list, mark receipts, notify) run
//! concurrently. Runs for the same family are serialized through a keyed
//! lock so two triggers cannot merge onto a stale base and overwrite each
//! other's update.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info};

use crate::llm::{decode_stores, LlmError, ReceiptExtractor};
use crate::merge;
use crate::models::{AnalysisRequest, NotificationEvent, ShoppingList, StoreBundle};
use crate::notify::{Notifier, NotifyError};
use crate::repository::{ReceiptRepository, RepositoryError, ShoppingListRepository};
use crate::stores;

/// Errors that abort an analysis run.
///
/// Parsing and repair problems never show up here; they degrade inside the
/// decoder. Only orchestration-level failures use this channel.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Analysis request is missing a family id")]
    MissingFamilyId,

    #[error("Model extraction produced no store data")]
    EmptyExtraction,

    #[error(transparent)]
    Extraction(#[from] LlmError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    /// Receipts consumed by this run.
    pub receipts_processed: usize,
    /// Items newly added to the list.
    pub new_items: usize,
    /// Stores the extraction touched.
    pub stores_touched: usize,
    /// Merged list id; absent when the run was a no-op.
    pub list_id: Option<String>,
}

impl AnalysisOutcome {
    fn no_op() -> Self {
        Self {
            receipts_processed: 0,
            new_items: 0,
            stores_touched: 0,
            list_id: None,
        }
    }
}

/// Drives one analysis run end to end.
pub struct AnalysisService {
    receipts: Arc<dyn ReceiptRepository>,
    lists: Arc<dyn ShoppingListRepository>,
    extractor: Arc<dyn ReceiptExtractor>,
    notifier: Arc<dyn Notifier>,
    family_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AnalysisService {
    /// Create a new analysis service.
    pub fn new(
        receipts: Arc<dyn ReceiptRepository>,
        lists: Arc<dyn ShoppingListRepository>,
        extractor: Arc<dyn ReceiptExtractor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            receipts,
            lists,
            extractor,
            notifier,
            family_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Run the pipeline for one request.
    ///
    /// A request without a family id fails before touching storage. A
    /// family with no unprocessed receipts completes successfully with no
    /// side effects. An extraction that decodes to nothing is a fatal
    /// failure so the trigger can retry or alert. Finalize failures
    /// propagate without rolling back sibling operations that already
    /// committed.
    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        let family_id = request.family_id.trim();
        if family_id.is_empty() {
            return Err(AnalysisError::MissingFamilyId);
        }

        // Serialize runs per family; see the module docs.
        let lock = self.family_lock(family_id);
        let _guard = lock.lock().await;

        let receipts = self.receipts.unprocessed_for_family(family_id).await?;
        if receipts.is_empty() {
            info!(family = family_id, "no unprocessed receipts; nothing to do");
            return Ok(AnalysisOutcome::no_op());
        }
        debug!(
            family = family_id,
            count = receipts.len(),
            "analyzing receipts"
        );

        let combined = receipts
            .iter()
            .map(|r| r.raw_text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let response = self.extractor.extract(&combined).await?;
        let extracted = decode_stores(&response);
        if extracted.is_empty() {
            return Err(AnalysisError::EmptyExtraction);
        }

        let existing = match self.lists.get(family_id).await? {
            Some(list) => list,
            None => ShoppingList::new(family_id),
        };

        let merged = merge::merge(&existing, &extracted);
        let new_items = merged.total_items() - existing.total_items();
        let annotation = normalized_annotation(&extracted);
        let primary_store = annotation
            .keys()
            .next()
            .cloned()
            .unwrap_or_else(|| stores::UNKNOWN_STORE.to_string());
        let purchase_date = extracted.values().find_map(|bundle| {
            bundle
                .purchase_date
                .as_deref()
                .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        });

        let persist = async {
            self.lists.save(&merged).await?;
            Ok::<_, AnalysisError>(())
        };

        let mark = async {
            for receipt in &receipts {
                let mut updated = receipt.clone();
                updated.mark_processed(Some(primary_store.clone()), annotation.clone());
                updated.purchase_date = purchase_date;
                self.receipts.save(&updated).await?;
            }
            Ok::<_, AnalysisError>(())
        };

        let notify = async {
            let event = NotificationEvent::list_update(
                &request.user_email,
                &primary_store,
                format!(
                    "Added {} new item(s) across {} store(s)",
                    new_items,
                    extracted.len()
                ),
                &merged.id,
            );
            self.notifier.send(&event).await?;
            Ok::<_, AnalysisError>(())
        };

        tokio::try_join!(persist, mark, notify)?;

        info!(
            family = family_id,
            receipts = receipts.len(),
            new_items,
            stores = extracted.len(),
            "analysis run complete"
        );

        Ok(AnalysisOutcome {
            receipts_processed: receipts.len(),
            new_items,
            stores_touched: extracted.len(),
            list_id: Some(merged.id),
        })
    }

    /// Lock handle for a family, created on first use.
    fn family_lock(&self, family_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .family_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(family_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// Receipt annotation: extracted items keyed by normalized store name.
fn normalized_annotation(
    extracted: &BTreeMap<String, StoreBundle>,
) -> BTreeMap<String, Vec<String>> {
    extracted
        .iter()
        .map(|(store, bundle)| (stores::normalize(store), bundle.items.clone()))
        .collect()
}
