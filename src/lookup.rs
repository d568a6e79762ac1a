// 🌐 External Lookup - optional fallback after a NONE match
//
// The core never calls a lookup itself. Callers that get MatchType::None may
// ask a ProductLookup, merge the answer into a display name and feed it back
// into the catalog through the registry.

use crate::gtin;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Shape of an external product-database answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProduct {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

impl ExternalProduct {
    pub fn new(name: &str, brand: Option<&str>) -> Self {
        ExternalProduct {
            name: name.to_string(),
            brand: brand.map(|b| b.to_string()),
        }
    }

    /// Name shown to the user and stored in the catalog.
    ///
    /// The brand is appended in parentheses unless the name already
    /// mentions it; a missing name falls back to the brand alone.
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        let brand = self.brand.as_deref().map(str::trim).unwrap_or("");

        if brand.is_empty() {
            return name.to_string();
        }
        if name.is_empty() {
            return brand.to_string();
        }
        if name.to_lowercase().contains(&brand.to_lowercase()) {
            return name.to_string();
        }

        format!("{} ({})", name, brand)
    }

    /// Usable only when something displayable came back
    pub fn is_usable(&self) -> bool {
        !self.display_name().is_empty()
    }
}

/// Resolve an identifier outside the local catalog
pub trait ProductLookup: Send + Sync {
    /// `Ok(None)` means "not found"; `Err` means the source failed
    fn lookup(&self, code: &str) -> Result<Option<ExternalProduct>>;

    /// Source name for logs
    fn source(&self) -> &str {
        "external"
    }
}

// ============================================================================
// STATIC LOOKUP
// ============================================================================

/// In-memory lookup table, e.g. an offline dump of a product database
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    products: HashMap<String, ExternalProduct>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{ "<gtin>": { "name": "...", "brand": "..." }, ... }`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read lookup file: {:?}", path.as_ref()))?;

        let raw: HashMap<String, ExternalProduct> =
            serde_json::from_str(&content).context("Failed to parse lookup JSON")?;

        let mut lookup = StaticLookup::new();
        for (code, product) in raw {
            lookup.insert(&code, product);
        }
        Ok(lookup)
    }

    /// Keys are stored as GTIN-14 so any padding of the same code hits
    pub fn insert(&mut self, code: &str, product: ExternalProduct) {
        let key = gtin::to_gtin14(&gtin::digits_only(code));
        self.products.insert(key, product);
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductLookup for StaticLookup {
    fn lookup(&self, code: &str) -> Result<Option<ExternalProduct>> {
        let digits = gtin::digits_only(code);
        if digits.is_empty() {
            return Ok(None);
        }
        let key = gtin::to_gtin14(&digits);
        Ok(self.products.get(&key).cloned())
    }

    fn source(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_appends_brand() {
        let product = ExternalProduct::new("Paracetamol 500mg", Some("Panadol"));
        assert_eq!(product.display_name(), "Paracetamol 500mg (Panadol)");
    }

    #[test]
    fn test_display_name_brand_already_in_name() {
        let product = ExternalProduct::new("Panadol Extra", Some("PANADOL"));
        assert_eq!(product.display_name(), "Panadol Extra");
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(ExternalProduct::new("  Zinc  ", None).display_name(), "Zinc");
        assert_eq!(ExternalProduct::new("", Some("Acme")).display_name(), "Acme");
        assert_eq!(ExternalProduct::new(" ", Some(" ")).display_name(), "");
        assert!(!ExternalProduct::new("", None).is_usable());
    }

    #[test]
    fn test_static_lookup_ignores_padding() {
        let mut lookup = StaticLookup::new();
        lookup.insert("5012345678900", ExternalProduct::new("Paracetamol", None));

        let hit = lookup.lookup("05012345678900").unwrap();
        assert_eq!(hit.map(|p| p.name), Some("Paracetamol".to_string()));
        assert!(lookup.lookup("09999999999999").unwrap().is_none());
        assert!(lookup.lookup("").unwrap().is_none());
    }

    #[test]
    fn test_brand_is_optional_in_json() {
        let product: ExternalProduct = serde_json::from_str(r#"{"name":"Zinc"}"#).unwrap();
        assert_eq!(product.brand, None);
    }
}
