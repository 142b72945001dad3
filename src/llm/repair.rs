//! Repair of malformed JSON emitted by the extraction model.
//!
//! The model wraps its output in markdown fences, adds commentary around
//! the object, escapes apostrophes as `\"`, truncates string values, and
//! occasionally single-quotes the whole document. This module coerces those
//! known failure classes back into parseable JSON text. It is not a general
//! JSON recovery engine: anything it cannot fix degrades to the literal
//! `"{}"` and the decoder turns that into an empty extraction.

use std::sync::LazyLock;

use regex::Regex;

/// A quoted key fragment split by a possessive apostrophe that arrived as a
/// bare double quote: `"Sam"s Club":` should have been `"Sam's Club":`.
static SPLIT_POSSESSIVE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"\n]*)"s([^"\n]*)"\s*:"#).unwrap());

/// A string value opened after `:`, `[`, `,` or `{` that runs into a comma
/// at end of line without a closing quote.
static UNTERMINATED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([:\[,{]\s*)"([^"\n]*),(\s*\n)"#).unwrap());

/// A single-quoted property name: `'items':`.
static SINGLE_QUOTED_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'([^'\n]*)'(\s*:)"#).unwrap());

/// A single-quoted string value in key, array, or object position.
static SINGLE_QUOTED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([:,\[{]\s*)'([^'\n]*)'(\s*[,}\]\n])"#).unwrap());

/// Coerce raw model output into syntactically valid JSON text.
///
/// Applies a fixed sequence of transformations over the whole string and
/// never fails; input without an outer `{...}` span yields `"{}"`. The
/// pipeline is idempotent: already-valid double-quoted JSON passes through
/// unchanged, and running the repair on its own output is a no-op.
pub fn repair(raw: &str) -> String {
    // Step 1: drop markdown fence markers, language tag first.
    let text = raw.replace("```json", "").replace("```", "");

    // Step 2: the payload must contain one object. Without both braces
    // there is nothing to recover.
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return "{}".to_string();
    };
    if end < start {
        return "{}".to_string();
    }

    // Step 3: discard prefix/suffix commentary around the object.
    let text = &text[start..=end];

    // Step 4: escaped quotes inside values are almost always stylistic
    // apostrophes the model decided to quote, not structural quoting.
    let text = text.replace("\\\"", "'");

    // Step 5: re-join property names split by a possessive apostrophe that
    // arrived as a bare quote.
    let text = SPLIT_POSSESSIVE_KEY.replace_all(&text, "\"${1}'s${2}\":");

    // Step 6: close string values truncated before a comma at end of line.
    // Best effort; values legitimately containing commas on one line are
    // left alone because their closing quote blocks the match.
    let text = UNTERMINATED_VALUE.replace_all(&text, "${1}\"${2}\",${3}");

    // Step 7: re-delimit single-quoted keys and values. Only quotes in
    // delimiter position are touched, so apostrophes introduced by step 4
    // survive inside values. The value pattern consumes the delimiter that
    // anchors the next match, so it runs to a fixpoint for sequences like
    // `['Milk', 'Eggs']`.
    let mut text = SINGLE_QUOTED_KEY
        .replace_all(&text, "\"${1}\"${2}")
        .into_owned();
    loop {
        let pass = SINGLE_QUOTED_VALUE
            .replace_all(&text, "${1}\"${2}\"${3}")
            .into_owned();
        if pass == text {
            break;
        }
        text = pass;
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_json_passes_through_unchanged() {
        let cases = [
            "{}",
            r#"{"items": ["Milk", "Eggs"], "prices": [4.49, null]}"#,
            r#"{"stores": {"Kroger": {"items": ["Milk"]}}}"#,
            r#"{"Sam's Club": ["Paper Towels"]}"#,
            "{\n  \"items\": [\n    \"Milk\",\n    \"Eggs\"\n  ]\n}",
        ];
        for case in cases {
            assert_eq!(repair(case), case, "altered valid input: {case}");
        }
    }

    #[test]
    fn is_idempotent_on_repaired_output() {
        let cases = [
            "```json\n{\"a\": 1}\n```",
            r#"{"Sam"s Club": ["Snacks"]}"#,
            "{\"purchase_date\": \"2025-03-26,\n\"transaction_id\": null}",
            r#"{'items': ['Milk', 'Eggs']}"#,
        ];
        for case in cases {
            let once = repair(case);
            assert_eq!(repair(&once), once, "not idempotent for: {case}");
        }
    }

    #[test]
    fn input_without_braces_degrades_to_empty_object() {
        assert_eq!(repair(""), "{}");
        assert_eq!(repair("Sorry, I could not read the receipt."), "{}");
        assert_eq!(repair("prefix only {"), "{}");
        assert_eq!(repair("} suffix only"), "{}");
    }

    #[test]
    fn strips_markdown_fences() {
        let fenced = "```json\n{\"items\": [\"Milk\"]}\n```";
        assert_eq!(repair(fenced), "{\"items\": [\"Milk\"]}");

        let untagged = "```\n{\"items\": []}\n```";
        assert_eq!(repair(untagged), "{\"items\": []}");
    }

    #[test]
    fn discards_commentary_around_object() {
        let chatty = "Here is the structured data you asked for:\n{\"a\": 1}\nLet me know!";
        assert_eq!(repair(chatty), "{\"a\": 1}");
    }

    #[test]
    fn escaped_quotes_become_apostrophes() {
        let raw = r#"{"note": "say \"hi\" to mom"}"#;
        assert_eq!(repair(raw), r#"{"note": "say 'hi' to mom"}"#);
    }

    #[test]
    fn reassembles_possessive_keys() {
        let raw = r#"{"Sam"s Club": ["Snacks"]}"#;
        assert_eq!(repair(raw), r#"{"Sam's Club": ["Snacks"]}"#);
    }

    #[test]
    fn closes_unterminated_values_before_comma() {
        let raw = "{\"purchase_date\": \"2025-03-26,\n\"transaction_id\": \"T-1\"}";
        let repaired = repair(raw);
        assert_eq!(
            repaired,
            "{\"purchase_date\": \"2025-03-26\",\n\"transaction_id\": \"T-1\"}"
        );
        assert!(serde_json::from_str::<serde_json::Value>(&repaired).is_ok());
    }

    #[test]
    fn leaves_commas_inside_terminated_values_alone() {
        let raw = "{\"item\": \"Shirt, Red, Large\",\n\"qty\": 1}";
        assert_eq!(repair(raw), raw);
    }

    #[test]
    fn converts_single_quoted_documents() {
        let raw = "{'items': ['Milk', 'Eggs'],\n'prices': [4.49, 2.99]}";
        let repaired = repair(raw);
        let value: serde_json::Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["items"][0], "Milk");
        assert_eq!(value["prices"][1], 2.99);
    }

    #[test]
    fn full_pipeline_produces_parseable_json() {
        let raw = "```json\nThe receipt shows:\n{\"Sam\"s Club\": {\"items\": [\"Rotisserie Chicken\"], \"purchase_date\": \"2025-03-26,\n\"transaction_id\": null}}\n```";
        let repaired = repair(raw);
        let value: serde_json::Value = serde_json::from_str(&repaired).unwrap();
        assert!(value.get("Sam's Club").is_some());
    }
}
