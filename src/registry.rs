// 🗂️ Catalog Registry - owns the catalog, publishes immutable index snapshots
//
// Writers serialize on the catalog mutex, rebuild the whole index and swap an
// Arc in one step. Readers clone the Arc and match against it without holding
// any lock, so they see either the old index or the new one, never a mix.

use crate::catalog::{rebuild_index, Catalog, CatalogEntry, CatalogIndex};
use crate::gs1::ParsedCode;
use crate::lookup::{ExternalProduct, ProductLookup};
use crate::matcher::{match_product, MatchResult, MatchType};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

pub struct CatalogRegistry {
    /// Source of truth; also the rebuild lock
    catalog: Mutex<Catalog>,

    /// Latest published index
    index: RwLock<Arc<CatalogIndex>>,

    next_version: AtomicU64,
}

impl CatalogRegistry {
    pub fn new(catalog: Catalog) -> Self {
        let registry = CatalogRegistry {
            catalog: Mutex::new(Catalog::new()),
            index: RwLock::new(Arc::new(CatalogIndex::default())),
            next_version: AtomicU64::new(1),
        };
        registry.replace(catalog);
        registry
    }

    fn lock_catalog(&self) -> MutexGuard<'_, Catalog> {
        self.catalog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rebuild from `catalog` and publish. Caller holds the catalog lock.
    fn publish(&self, catalog: &Catalog) -> u64 {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let mut index = rebuild_index(catalog);
        index.version = version;

        log::info!(
            "Published catalog index v{} ({} entries, {} exact keys, {} last-8 buckets)",
            version,
            catalog.len(),
            index.exact.len(),
            index.last8.len()
        );

        let mut slot = self.index.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Arc::new(index);
        version
    }

    // ========================================================================
    // READ SIDE
    // ========================================================================

    /// Current index; stays valid (and unchanged) while the caller holds it
    pub fn snapshot(&self) -> Arc<CatalogIndex> {
        let slot = self.index.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&slot)
    }

    /// Version of the currently published index
    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    pub fn len(&self) -> usize {
        self.lock_catalog().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_catalog().is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<String> {
        self.lock_catalog().get(identifier).map(str::to_string)
    }

    /// Match a decoded scan against the current snapshot
    pub fn resolve(&self, parsed: &ParsedCode) -> MatchResult {
        if !parsed.valid {
            return MatchResult::none();
        }
        match_product(&self.snapshot(), &parsed.gtin14, &parsed.gtin13)
    }

    /// Resolve, and on NONE ask `lookup` and persist what it finds.
    ///
    /// Lookup failures are logged and reported as NONE; they never fail the
    /// scan.
    pub fn resolve_with_fallback(
        &self,
        parsed: &ParsedCode,
        lookup: &dyn ProductLookup,
    ) -> MatchResult {
        let result = self.resolve(parsed);
        if result.match_type != MatchType::None || !parsed.valid {
            return result;
        }

        match lookup.lookup(&parsed.gtin14) {
            Ok(Some(product)) => self.merge_external(&parsed.gtin14, &product),
            Ok(None) => result,
            Err(e) => {
                log::warn!(
                    "{} lookup failed for {}: {:#}",
                    lookup.source(),
                    parsed.gtin14,
                    e
                );
                result
            }
        }
    }

    // ========================================================================
    // WRITE SIDE (every change rebuilds and republishes)
    // ========================================================================

    /// Insert or replace one entry; returns the new index version
    pub fn upsert(&self, identifier: &str, product_name: &str) -> u64 {
        let mut catalog = self.lock_catalog();
        catalog.upsert(identifier, product_name);
        self.publish(&catalog)
    }

    /// Apply many upserts with a single rebuild
    pub fn upsert_many<I>(&self, entries: I) -> u64
    where
        I: IntoIterator<Item = CatalogEntry>,
    {
        let mut catalog = self.lock_catalog();
        for entry in entries {
            catalog.upsert(&entry.identifier, &entry.product_name);
        }
        self.publish(&catalog)
    }

    /// Remove an entry; republishes only if something was removed
    pub fn remove(&self, identifier: &str) -> Option<String> {
        let mut catalog = self.lock_catalog();
        let removed = catalog.remove(identifier)?;
        self.publish(&catalog);
        Some(removed)
    }

    /// Swap in a whole new catalog (bulk reload)
    pub fn replace(&self, new_catalog: Catalog) -> u64 {
        let mut catalog = self.lock_catalog();
        *catalog = new_catalog;
        self.publish(&catalog)
    }

    /// Store an externally resolved product under `identifier` and report it
    /// as an API match. Unusable answers (no name, no brand) are ignored.
    pub fn merge_external(&self, identifier: &str, product: &ExternalProduct) -> MatchResult {
        if identifier.is_empty() || !product.is_usable() {
            return MatchResult::none();
        }

        let result = MatchResult::from_external(product);
        self.upsert(identifier, &result.product_name);
        result
    }

    /// Copy of the catalog, e.g. for persisting it elsewhere
    pub fn catalog(&self) -> Catalog {
        self.lock_catalog().clone()
    }
}

impl Default for CatalogRegistry {
    fn default() -> Self {
        Self::new(Catalog::new())
    }
}
