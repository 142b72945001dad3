//! Decoding repaired model output into typed per-store bundles.
//!
//! The model is asked for one JSON object but takes liberties with the
//! shape: sometimes the store entries sit at the top level, sometimes under
//! a `"stores"` wrapper, and field names drift in case. Decoding never
//! fails; anything unrecoverable becomes an empty map and the orchestrator
//! decides whether that is fatal.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::models::StoreBundle;

use super::repair::repair;

/// Shape of the repaired payload.
enum PayloadShape {
    /// Store entries at the top level of the object.
    Flat(Map<String, Value>),
    /// Store entries nested under a single `"stores"` wrapper key.
    Wrapped(Map<String, Value>),
    /// Nothing recoverable.
    Empty,
}

/// One item/price pairing projected onto a flat time series.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PricePoint {
    /// Shared purchase date string, when the receipt carried one.
    pub timestamp: Option<String>,
    pub store: String,
    pub item: String,
    pub price: Option<f64>,
    pub transaction_id: Option<String>,
}

/// Decode a raw model response into per-store bundles.
///
/// Unwraps a chat-API envelope (`choices[0].message.content`) when present,
/// repairs the payload text, then reads the store map out of whichever
/// shape the model chose. Returns an empty map on any failure.
pub fn decode_stores(response_text: &str) -> BTreeMap<String, StoreBundle> {
    let payload = envelope_content(response_text)
        .unwrap_or_else(|| response_text.to_string());
    let repaired = repair(&payload);

    let entries = match classify(&repaired) {
        PayloadShape::Flat(map) | PayloadShape::Wrapped(map) => map,
        PayloadShape::Empty => {
            debug!("model response contained no decodable store map");
            return BTreeMap::new();
        }
    };

    let mut stores = BTreeMap::new();
    for (store, value) in entries {
        if let Some(bundle) = decode_bundle(&value) {
            stores.insert(store, bundle);
        }
    }
    stores
}

/// Project a model response onto flat price records.
///
/// Pairs `items[i]` with `prices[i]` up to the shorter list's length;
/// anything past that is dropped. Every point for a store carries that
/// store's shared purchase date, or none if absent or empty.
pub fn price_points(response_text: &str) -> Vec<PricePoint> {
    let mut points = Vec::new();
    for (store, bundle) in decode_stores(response_text) {
        let paired = bundle.items.len().min(bundle.prices.len());
        for i in 0..paired {
            points.push(PricePoint {
                timestamp: bundle.purchase_date.clone(),
                store: store.clone(),
                item: bundle.items[i].clone(),
                price: bundle.prices[i],
                transaction_id: bundle.transaction_id.clone(),
            });
        }
    }
    points
}

/// Extract the inner text of a chat-API envelope, if the input is one.
fn envelope_content(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    value
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// Determine which of the known payload shapes the repaired text carries.
fn classify(repaired: &str) -> PayloadShape {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(repaired) else {
        return PayloadShape::Empty;
    };

    if map.len() == 1 {
        let wrapped = map
            .iter()
            .next()
            .filter(|(key, _)| key.eq_ignore_ascii_case("stores"))
            .and_then(|(_, value)| value.as_object().cloned());
        if let Some(inner) = wrapped {
            return PayloadShape::Wrapped(inner);
        }
    }

    PayloadShape::Flat(map)
}

/// Decode one store entry, preferring the strict typed shape and falling
/// back to tolerant field-by-field extraction. Entries that are neither
/// objects nor item arrays are dropped.
fn decode_bundle(value: &Value) -> Option<StoreBundle> {
    let bundle = match serde_json::from_value::<StoreBundle>(value.clone()) {
        Ok(bundle) => bundle,
        Err(_) => match value {
            Value::Object(obj) => tolerant_bundle(obj),
            Value::Array(items) => StoreBundle::with_items(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            _ => return None,
        },
    };

    Some(normalize_dates(bundle))
}

/// Blank purchase dates count as absent no matter which decode path
/// produced the bundle.
fn normalize_dates(mut bundle: StoreBundle) -> StoreBundle {
    bundle.purchase_date = bundle
        .purchase_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    bundle
}

/// Last-resort extraction: case-insensitive field names, per-field errors
/// suppressed, unknown members ignored.
fn tolerant_bundle(obj: &Map<String, Value>) -> StoreBundle {
    let mut bundle = StoreBundle::default();

    if let Some(items) = field(obj, "items") {
        bundle.items = match items {
            Value::Array(values) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Value::String(single) => vec![single.clone()],
            _ => Vec::new(),
        };
    }

    if let Some(Value::Array(values)) = field(obj, "prices") {
        bundle.prices = values.iter().map(lenient_price).collect();
    }

    bundle.purchase_date = field(obj, "purchase_date")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    bundle.transaction_id = field(obj, "transaction_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    bundle
}

/// Case-insensitive field lookup.
fn field<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    obj.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

/// Accept numbers, numeric strings, and nulls as prices.
fn lenient_price(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::decode_stores as decode;
    use super::*;

    const KROGER: &str = r#"{"stores":{"Kroger":{"items":["Milk"],"prices":[4.49],"purchase_date":"2025-03-26","transaction_id":null}}}"#;

    #[test]
    fn decodes_wrapped_shape() {
        let stores = decode(KROGER);
        assert_eq!(stores.len(), 1);
        let bundle = &stores["Kroger"];
        assert_eq!(bundle.items, vec!["Milk"]);
        assert_eq!(bundle.prices, vec![Some(4.49)]);
        assert_eq!(bundle.purchase_date.as_deref(), Some("2025-03-26"));
        assert_eq!(bundle.transaction_id, None);
    }

    #[test]
    fn decodes_flat_shape() {
        let flat = r#"{"Kroger":{"items":["Milk","Eggs"],"prices":[4.49,2.99]}}"#;
        let stores = decode(flat);
        assert_eq!(stores["Kroger"].items, vec!["Milk", "Eggs"]);
    }

    #[test]
    fn unwraps_chat_api_envelope() {
        let envelope = serde_json::json!({
            "choices": [{"message": {"content": KROGER}}]
        })
        .to_string();
        let stores = decode(&envelope);
        assert_eq!(stores["Kroger"].items, vec!["Milk"]);
    }

    #[test]
    fn field_names_match_case_insensitively() {
        let odd = r#"{"Kroger":{"Items":["Milk"],"PRICES":["4.49"],"Purchase_Date":"2025-03-26"}}"#;
        let bundle = &decode(odd)["Kroger"];
        assert_eq!(bundle.items, vec!["Milk"]);
        assert_eq!(bundle.prices, vec![Some(4.49)]);
        assert_eq!(bundle.purchase_date.as_deref(), Some("2025-03-26"));
    }

    #[test]
    fn bare_item_arrays_are_accepted() {
        let bare = r#"{"Kroger":["Milk","Eggs"]}"#;
        assert_eq!(decode(bare)["Kroger"].items, vec!["Milk", "Eggs"]);
    }

    #[test]
    fn garbage_decodes_to_empty_map() {
        assert!(decode("").is_empty());
        assert!(decode("no json here").is_empty());
        assert!(decode(r#"["not","an","object"]"#).is_empty());
    }

    #[test]
    fn repaired_malformed_output_still_decodes() {
        let fenced = "```json\n{\"Kroger\": {\"items\": [\"Milk\"]}}\n```";
        assert_eq!(decode(fenced)["Kroger"].items, vec!["Milk"]);
    }

    #[test]
    fn empty_purchase_date_becomes_none() {
        let blank = r#"{"Kroger":{"items":["Milk"],"purchase_date":"  "}}"#;
        assert_eq!(decode(blank)["Kroger"].purchase_date, None);
    }

    #[test]
    fn price_points_pair_to_shorter_list() {
        let uneven = r#"{"Kroger":{"items":["A","B","C"],"prices":[1.0,2.0],"purchase_date":"2025-03-26"}}"#;
        let points = price_points(uneven);
        assert_eq!(points.len(), 2);
        for point in &points {
            assert_eq!(point.timestamp.as_deref(), Some("2025-03-26"));
            assert_eq!(point.store, "Kroger");
        }
        assert_eq!(points[0].item, "A");
        assert_eq!(points[0].price, Some(1.0));
        assert_eq!(points[1].item, "B");
        assert_eq!(points[1].price, Some(2.0));
    }

    #[test]
    fn price_points_keep_null_prices_in_prefix() {
        let nulls = r#"{"Kroger":{"items":["A","B"],"prices":[null,2.0]}}"#;
        let points = price_points(nulls);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].price, None);
        assert_eq!(points[0].timestamp, None);
    }
}
