//! Per-store extraction bundles decoded from model output.

use serde::{Deserialize, Serialize};

/// Items and prices extracted for a single store in one analysis run.
///
/// `items` and `prices` are parallel lists but the model frequently emits
/// them with mismatched lengths; only the overlapping prefix pairs up.
/// Bundles are transient and never persisted as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreBundle {
    /// Item names in the order the model listed them.
    pub items: Vec<String>,
    /// Prices parallel to `items`; entries may be null.
    pub prices: Vec<Option<f64>>,
    /// Purchase date string as the model emitted it.
    pub purchase_date: Option<String>,
    /// Transaction id printed on the receipt, if any.
    pub transaction_id: Option<String>,
}

impl StoreBundle {
    /// Bundle with items only.
    pub fn with_items(items: Vec<String>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }
}
