// Pharma Scan - Core Library
// Barcode normalization, GS1 decoding and catalog matching for medicine packs

pub mod gtin;
pub mod normalizer;
pub mod gs1;
pub mod expiry;
pub mod catalog;
pub mod matcher;
pub mod registry;   // Atomic index publication
pub mod lookup;     // External lookup seam (used after a NONE match)
pub mod export;     // Scan history CSV/TSV
pub mod config;

// Re-export commonly used types
pub use gs1::{normalize_and_decode, AiField, Gs1Decoder, ParsedCode};
pub use normalizer::{convert_ai_tokens, normalize, CodeShape, NormalizedScan};
pub use expiry::{decode_yymmdd, Expiry, ExpiryStatus, EXPIRY_SOON_DAYS};
pub use catalog::{rebuild_index, Catalog, CatalogEntry, CatalogHit, CatalogIndex};
pub use matcher::{match_product, MatchResult, MatchType};
pub use registry::CatalogRegistry;
pub use lookup::{ExternalProduct, ProductLookup, StaticLookup};
pub use export::{export_to_file, write_records, ExportFormat, ScanRecord};
pub use config::ScanConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
