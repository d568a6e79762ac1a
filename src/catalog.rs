// 📚 Product Catalog + Index Builder
//
// The catalog is an insertion-ordered identifier → product-name mapping.
// CatalogIndex is derived from it and always rebuilt from scratch: one new
// entry can turn a unique last-8 bucket into an ambiguous one.

use crate::gtin;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(alias = "code", alias = "gtin")]
    pub identifier: String,

    #[serde(alias = "productName", alias = "name")]
    pub product_name: String,
}

impl CatalogEntry {
    pub fn new(identifier: &str, product_name: &str) -> Self {
        CatalogEntry {
            identifier: identifier.to_string(),
            product_name: product_name.to_string(),
        }
    }
}

/// Insertion-ordered catalog with unique identifiers.
///
/// Upserting an existing identifier replaces its name but keeps its original
/// position, so last-8 tie-breaks stay stable across edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    positions: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = CatalogEntry>,
    {
        let mut catalog = Catalog::new();
        for entry in entries {
            catalog.upsert(&entry.identifier, &entry.product_name);
        }
        catalog
    }

    /// Load a catalog from CSV with headers `identifier,product_name`.
    ///
    /// Rows with a blank identifier are skipped; duplicate identifiers keep
    /// the last name seen.
    pub fn from_csv(csv_path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(csv_path)
            .with_context(|| format!("Failed to open catalog: {}", csv_path.display()))?;

        let mut catalog = Catalog::new();
        let mut skipped = 0usize;

        for (line_num, result) in reader.deserialize().enumerate() {
            let entry: CatalogEntry = result.with_context(|| {
                format!(
                    "Failed to parse catalog line {} in {}",
                    line_num + 2,
                    csv_path.display()
                )
            })?;

            if entry.identifier.is_empty() {
                skipped += 1;
                continue;
            }

            catalog.upsert(&entry.identifier, &entry.product_name);
        }

        if skipped > 0 {
            log::debug!("Skipped {} catalog rows without identifier", skipped);
        }

        Ok(catalog)
    }

    /// Insert or replace (last writer wins)
    pub fn upsert(&mut self, identifier: &str, product_name: &str) {
        match self.positions.get(identifier) {
            Some(&pos) => self.entries[pos].product_name = product_name.to_string(),
            None => {
                self.positions
                    .insert(identifier.to_string(), self.entries.len());
                self.entries.push(CatalogEntry::new(identifier, product_name));
            }
        }
    }

    /// Remove an identifier; returns the removed product name
    pub fn remove(&mut self, identifier: &str) -> Option<String> {
        let pos = self.positions.remove(identifier)?;
        let removed = self.entries.remove(pos);

        for p in self.positions.values_mut() {
            if *p > pos {
                *p -= 1;
            }
        }

        Some(removed.product_name)
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.positions
            .get(identifier)
            .map(|&pos| self.entries[pos].product_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }
}

// ============================================================================
// CATALOG INDEX
// ============================================================================

/// One candidate in a last-8 bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogHit {
    /// Catalog identifier, digits only
    pub identifier: String,
    pub product_name: String,
}

/// Lookup structures derived from a catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    /// Every digit-normalized form of every identifier → product name
    pub exact: HashMap<String, String>,

    /// Last 8 digits → candidates in catalog insertion order
    pub last8: HashMap<String, Vec<CatalogHit>>,

    /// Publication counter set by the registry (0 when built standalone)
    pub version: u64,
}

impl CatalogIndex {
    /// Build both tables from scratch
    pub fn build(catalog: &Catalog) -> Self {
        let mut index = CatalogIndex::default();

        for entry in catalog.iter() {
            index.add_entry(&entry.identifier, &entry.product_name);
        }

        index
    }

    fn add_entry(&mut self, identifier: &str, name: &str) {
        let digits = gtin::digits_only(identifier);
        if digits.is_empty() {
            log::debug!("Skipping catalog entry without digits: {:?}", identifier);
            return;
        }

        self.insert_exact(&digits, name);
        self.insert_exact(identifier, name);

        if gtin::is_gtin_length(digits.len()) {
            let g14 = gtin::to_gtin14(&digits);
            let g13 = gtin::drop_leading_zero(&g14);
            let g12 = gtin::drop_leading_zero(g13);

            self.insert_exact(g12, name);
            self.insert_exact(g13, name);
            self.insert_exact(&g14, name);
            self.push_last8(gtin::last_n(&g14, 8), &digits, name);
        } else if digits.len() >= 8 {
            self.push_last8(gtin::last_n(&digits, 8), &digits, name);
        }

        let stripped = gtin::strip_leading_zeros(&digits);
        if !stripped.is_empty() && stripped != digits {
            self.insert_exact(stripped, name);
        }
    }

    fn insert_exact(&mut self, key: &str, name: &str) {
        self.exact.insert(key.to_string(), name.to_string());
    }

    fn push_last8(&mut self, key: &str, digits: &str, name: &str) {
        self.last8.entry(key.to_string()).or_default().push(CatalogHit {
            identifier: digits.to_string(),
            product_name: name.to_string(),
        });
    }

    pub fn lookup_exact(&self, key: &str) -> Option<&str> {
        self.exact.get(key).map(String::as_str)
    }

    /// Candidates sharing these last 8 digits (empty slice when none)
    pub fn lookup_last8(&self, key: &str) -> &[CatalogHit] {
        self.last8.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

/// Build a fresh index for `catalog`. Pure and deterministic.
pub fn rebuild_index(catalog: &Catalog) -> CatalogIndex {
    CatalogIndex::build(catalog)
}
