//! Store name normalization and fuzzy matching.
//!
//! Receipts spell the same store a dozen ways ("WAL-MART #2054",
//! "Walmart Supercenter", "walmart"). Normalization produces a stable map
//! key; the matcher decides whether two spellings denote the same store so
//! the merger can fold variants into one bucket instead of fragmenting the
//! list.

/// Key used when a store name normalizes to nothing.
pub const UNKNOWN_STORE: &str = "Unknown Store";

/// Minimum normalized Levenshtein similarity for two names to match.
const SIMILARITY_THRESHOLD: f64 = 0.80;

/// Canonicalize a store name into a stable map key.
///
/// Strips everything that is not alphanumeric or whitespace, collapses
/// whitespace runs, and title-cases the remainder. An empty or fully
/// stripped name yields [`UNKNOWN_STORE`].
pub fn normalize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let normalized = cleaned
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ");

    if normalized.is_empty() {
        UNKNOWN_STORE.to_string()
    } else {
        normalized
    }
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Decide whether two store names refer to the same store.
///
/// Exact match and substring containment (either direction) short-circuit;
/// otherwise the decision falls to Levenshtein similarity against
/// [`SIMILARITY_THRESHOLD`].
pub fn are_similar(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if a == b {
        return true;
    }
    if a.contains(&b) || b.contains(&a) {
        return true;
    }

    strsim::normalized_levenshtein(&a, &b) >= SIMILARITY_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_title_cases() {
        assert_eq!(normalize("  Sam's   Club!! "), "Sams Club");
        assert_eq!(normalize("WAL-MART"), "Walmart");
        assert_eq!(normalize("trader joe's #512"), "Trader Joes 512");
    }

    #[test]
    fn normalize_empty_yields_sentinel() {
        assert_eq!(normalize(""), UNKNOWN_STORE);
        assert_eq!(normalize("  ***  "), UNKNOWN_STORE);
    }

    #[test]
    fn exact_and_containment_match() {
        assert!(are_similar("Walmart", "Walmart"));
        assert!(are_similar("Walmart Supercenter", "Walmart"));
        assert!(are_similar("walmart", "  WALMART  "));
    }

    #[test]
    fn near_spellings_match() {
        assert!(are_similar("Kroger Marketplace", "Kroger Marketplce"));
    }

    #[test]
    fn different_stores_do_not_match() {
        assert!(!are_similar("Kroger", "Walmart"));
        assert!(!are_similar("Target", "Costco"));
    }
}
