//! Prompt templates for receipt extraction.

/// Default prompt for structuring receipt OCR text into per-store data.
///
/// The `{receipts}` placeholder receives the concatenated raw text of every
/// unprocessed receipt in the run.
pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"You are analyzing OCR text captured from one or more shopping receipts. Structure every receipt into per-store shopping data.

Store name rules:
- Use the canonical brand name, never the printed banner (e.g. "WAL*MART #2054" is "Walmart", "KROGER 530" is "Kroger").
- Drop store numbers, street addresses, and location qualifiers.

Item name rules:
- Expand receipt abbreviations into plain product names (e.g. "GV WHL MLK" is "Whole Milk", "BNLS CHKN BRST" is "Boneless Chicken Breast").
- Keep one entry per distinct product. Do NOT invent items that are not on the receipt.

Respond with ONLY one JSON object and nothing else - no markdown fences, no commentary. Use exactly this shape:

{"stores": {"<store name>": {"items": ["<item>"], "prices": [0.00], "purchase_date": "YYYY-MM-DD", "transaction_id": "<id>"}}}

The prices list must parallel the items list; use null for any value you cannot read, including purchase_date and transaction_id.

Receipt text:
{receipts}"#;
