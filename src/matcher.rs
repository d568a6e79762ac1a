// 🔍 Product Matcher - ordered cascade of exact and last-8 lookups
//
// Strategies run from most to least specific and the first hit wins, so a
// fuzzy last-8 hit can never shadow an exact one. No edit-distance matching:
// only digit-string equality after a fixed set of canonical transforms.

use crate::catalog::{CatalogHit, CatalogIndex};
use crate::gtin;
use crate::lookup::ExternalProduct;
use serde::{Deserialize, Serialize};

// ============================================================================
// MATCH TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchType {
    /// Identifier (in one of its canonical forms) is in the catalog
    Exact,

    /// Exactly one catalog entry shares the last 8 digits
    Last8,

    /// Several catalog entries share the last 8 digits
    Ambiguous,

    /// Resolved by an external lookup, not the catalog
    Api,

    /// Nothing found
    None,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "EXACT",
            MatchType::Last8 => "LAST8",
            MatchType::Ambiguous => "AMBIGUOUS",
            MatchType::Api => "API",
            MatchType::None => "NONE",
        }
    }
}

// ============================================================================
// MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub product_name: String,
    pub match_type: MatchType,

    /// Every bucket entry when `match_type` is `Ambiguous`, in catalog order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<CatalogHit>,
}

impl MatchResult {
    pub fn exact(name: &str) -> Self {
        MatchResult {
            product_name: name.to_string(),
            match_type: MatchType::Exact,
            candidates: Vec::new(),
        }
    }

    pub fn none() -> Self {
        MatchResult {
            product_name: String::new(),
            match_type: MatchType::None,
            candidates: Vec::new(),
        }
    }

    /// Result for a name resolved by an external lookup
    pub fn from_external(product: &ExternalProduct) -> Self {
        MatchResult {
            product_name: product.display_name(),
            match_type: MatchType::Api,
            candidates: Vec::new(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.match_type != MatchType::None
    }

    /// Ambiguous results should be confirmed by a person
    pub fn needs_review(&self) -> bool {
        self.match_type == MatchType::Ambiguous
    }
}

// ============================================================================
// MATCHER
// ============================================================================

/// Resolve an identifier against the catalog index.
///
/// Cascade (first hit wins):
/// 1. exact gtin14 digits, then exact gtin13 digits
/// 2. exact gtin14 padded to 14
/// 3. exact gtin14 without leading zeros
/// 4. last-8 bucket (one entry → LAST8, more → AMBIGUOUS with the
///    first-inserted entry's name as best guess)
/// 5. codes of 5..=11 digits padded to every width up to 14
/// 6. NONE
pub fn match_product(index: &CatalogIndex, gtin14: &str, gtin13: &str) -> MatchResult {
    let digits14 = gtin::digits_only(gtin14);
    let digits13 = gtin::digits_only(gtin13);

    if digits14.is_empty() && digits13.is_empty() {
        return MatchResult::none();
    }

    // 1. As scanned
    for key in [&digits14, &digits13] {
        if key.is_empty() {
            continue;
        }
        if let Some(name) = index.lookup_exact(key) {
            return MatchResult::exact(name);
        }
    }

    if digits14.is_empty() {
        return MatchResult::none();
    }

    // 2. GTIN-14 padded
    if let Some(name) = index.lookup_exact(&gtin::to_gtin14(&digits14)) {
        return MatchResult::exact(name);
    }

    // 3. Leading zeros stripped
    let stripped = gtin::strip_leading_zeros(&digits14);
    if !stripped.is_empty() {
        if let Some(name) = index.lookup_exact(stripped) {
            return MatchResult::exact(name);
        }
    }

    // 4. Last 8 digits
    if digits14.len() >= 8 {
        let bucket = index.lookup_last8(gtin::last_n(&digits14, 8));
        match bucket {
            [] => {}
            [only] => {
                return MatchResult {
                    product_name: only.product_name.clone(),
                    match_type: MatchType::Last8,
                    candidates: Vec::new(),
                };
            }
            [first, ..] => {
                return MatchResult {
                    product_name: first.product_name.clone(),
                    match_type: MatchType::Ambiguous,
                    candidates: bucket.to_vec(),
                };
            }
        }
    }

    // 5. Internal codes stored at another zero-padding width
    if (5..=11).contains(&digits14.len()) {
        for width in digits14.len()..=14 {
            if let Some(name) = index.lookup_exact(&gtin::pad_left(&digits14, width)) {
                return MatchResult::exact(name);
            }
        }
    }

    MatchResult::none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{rebuild_index, Catalog, CatalogEntry};

    fn index(entries: &[(&str, &str)]) -> CatalogIndex {
        let catalog =
            Catalog::from_entries(entries.iter().map(|(id, name)| CatalogEntry::new(id, name)));
        rebuild_index(&catalog)
    }

    // ========================================================================
    // EXACT
    // ========================================================================

    #[test]
    fn test_exact_ean13_from_gtin14() {
        let idx = index(&[("5012345678900", "Paracetamol 500mg")]);
        let result = match_product(&idx, "05012345678900", "5012345678900");

        assert_eq!(result.match_type, MatchType::Exact);
        assert_eq!(result.product_name, "Paracetamol 500mg");
    }

    #[test]
    fn test_exact_gtin14_only() {
        let idx = index(&[("5012345678900", "Paracetamol 500mg")]);
        let result = match_product(&idx, "05012345678900", "");

        assert_eq!(result, MatchResult::exact("Paracetamol 500mg"));
    }

    #[test]
    fn test_exact_via_gtin13_field() {
        // Catalog holds an identifier that only the gtin13 form hits
        let idx = index(&[("0000012", "Odd")]);
        let result = match_product(&idx, "99999999999999", "0000012");

        assert_eq!(result.match_type, MatchType::Exact);
    }

    #[test]
    fn test_exact_padding_step() {
        let idx = index(&[("00000012345678", "Zinc tablets")]);
        // 10-digit scan only hits once padded to GTIN-14
        let result = match_product(&idx, "0012345678", "");

        assert_eq!(result.match_type, MatchType::Exact);
        assert_eq!(result.product_name, "Zinc tablets");
    }

    #[test]
    fn test_exact_catalog_without_leading_zeros() {
        // Catalog stores a short code without padding; scan is padded
        let idx = index(&[("12345", "Internal SKU")]);
        let result = match_product(&idx, "00000000012345", "0000000012345");

        assert_eq!(result.match_type, MatchType::Exact);
        assert_eq!(result.product_name, "Internal SKU");
    }

    #[test]
    fn test_exact_wins_over_last8() {
        let idx = index(&[
            ("10000012345678", "Exact one"),
            ("20000012345678", "Other"),
        ]);
        let result = match_product(&idx, "20000012345678", "20000012345678");

        assert_eq!(result.match_type, MatchType::Exact);
        assert_eq!(result.product_name, "Other");
    }

    // ========================================================================
    // LAST8 / AMBIGUOUS
    // ========================================================================

    #[test]
    fn test_last8_single_candidate() {
        let idx = index(&[("10000012345678", "Amoxicillin 250mg")]);
        let result = match_product(&idx, "30000012345678", "30000012345678");

        assert_eq!(result.match_type, MatchType::Last8);
        assert_eq!(result.product_name, "Amoxicillin 250mg");
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn test_ambiguous_returns_first_inserted() {
        let idx = index(&[
            ("10000012345678", "Amoxicillin 250mg"),
            ("20000012345678", "Amoxicillin 500mg"),
        ]);
        let result = match_product(&idx, "30000012345678", "30000012345678");

        assert_eq!(result.match_type, MatchType::Ambiguous);
        assert_eq!(result.product_name, "Amoxicillin 250mg");
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.candidates[1].product_name, "Amoxicillin 500mg");
        assert!(result.needs_review());
    }

    #[test]
    fn test_new_entry_turns_last8_into_ambiguous() {
        let mut catalog = Catalog::new();
        catalog.upsert("10000012345678", "A");
        let before = match_product(&rebuild_index(&catalog), "30000012345678", "");
        assert_eq!(before.match_type, MatchType::Last8);

        catalog.upsert("20000012345678", "B");
        let after = match_product(&rebuild_index(&catalog), "30000012345678", "");
        assert_eq!(after.match_type, MatchType::Ambiguous);
    }

    // ========================================================================
    // Short-code padding loop
    // ========================================================================

    #[test]
    fn test_short_code_padded_width() {
        // Catalog stores the SKU zero-padded to 9 digits, scan is unpadded
        let idx = index(&[("000054321", "Padded SKU")]);
        let result = match_product(&idx, "54321", "54321");

        assert_eq!(result.match_type, MatchType::Exact);
        assert_eq!(result.product_name, "Padded SKU");
    }

    // ========================================================================
    // NONE
    // ========================================================================

    #[test]
    fn test_unknown_gtin14_is_none() {
        let idx = index(&[("5012345678900", "Paracetamol 500mg")]);
        let result = match_product(&idx, "09999999999999", "9999999999999");

        assert_eq!(result, MatchResult::none());
        assert!(!result.is_match());
    }

    #[test]
    fn test_empty_input_is_none() {
        let idx = index(&[("5012345678900", "Paracetamol 500mg")]);
        assert_eq!(match_product(&idx, "", "").match_type, MatchType::None);
        assert_eq!(match_product(&idx, "abc", "").match_type, MatchType::None);
    }

    #[test]
    fn test_empty_index_is_none() {
        let idx = CatalogIndex::default();
        let result = match_product(&idx, "05012345678900", "5012345678900");
        assert_eq!(result.match_type, MatchType::None);
    }

    #[test]
    fn test_match_type_serializes_uppercase() {
        let json = serde_json::to_string(&MatchResult::exact("X")).unwrap();
        assert_eq!(json, r#"{"productName":"X","matchType":"EXACT"}"#);
        assert_eq!(MatchType::Last8.as_str(), "LAST8");
        assert_eq!(
            serde_json::to_string(&MatchType::Last8).unwrap(),
            r#""LAST8""#
        );
    }
}
