// Pharma Scan - Web Server
// JSON API over the decoder and the catalog registry

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use pharma_scan::{
    Catalog, CatalogRegistry, ExternalProduct, Gs1Decoder, MatchResult, ParsedCode, ScanConfig,
    ScanRecord,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    registry: Arc<CatalogRegistry>,
    decoder: Arc<Gs1Decoder>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn err(data: T, error: String) -> Self {
        Self {
            success: false,
            data,
            error: Some(error),
        }
    }
}

/// Catalog status
#[derive(Serialize)]
struct CatalogStatus {
    entries: usize,
    index_version: u64,
}

/// POST /api/catalog body
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertRequest {
    identifier: String,
    product_name: String,
}

/// POST /api/catalog/external body
#[derive(Deserialize)]
struct ExternalRequest {
    identifier: String,
    #[serde(flatten)]
    product: ExternalProduct,
}

/// Decode + match response
#[derive(Serialize)]
struct ScanResponse {
    parsed: ParsedCode,
    #[serde(rename = "match")]
    matched: MatchResult,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/catalog - Catalog size and published index version
async fn catalog_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(CatalogStatus {
        entries: state.registry.len(),
        index_version: state.registry.version(),
    }))
}

/// GET /api/decode/:raw - Decode a scan without matching
async fn decode_scan(State(state): State<AppState>, Path(raw): Path<String>) -> impl IntoResponse {
    let raw = decode_path(&raw);
    Json(ApiResponse::ok(state.decoder.decode(&raw)))
}

/// GET /api/match/:raw - Decode a scan and resolve it against the catalog
async fn match_scan(State(state): State<AppState>, Path(raw): Path<String>) -> impl IntoResponse {
    let raw = decode_path(&raw);
    let parsed = state.decoder.decode(&raw);
    let matched = state.registry.resolve(&parsed);

    Json(ApiResponse::ok(ScanResponse { parsed, matched }))
}

/// POST /api/catalog - Insert or replace one catalog entry
async fn upsert_entry(
    State(state): State<AppState>,
    Json(req): Json<UpsertRequest>,
) -> impl IntoResponse {
    if req.identifier.trim().is_empty() || req.product_name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err(
                0u64,
                "identifier and productName are required".to_string(),
            )),
        )
            .into_response();
    }

    let version = state.registry.upsert(req.identifier.trim(), req.product_name.trim());
    (StatusCode::OK, Json(ApiResponse::ok(version))).into_response()
}

/// POST /api/catalog/external - Store a name found by an external lookup
async fn merge_external(
    State(state): State<AppState>,
    Json(req): Json<ExternalRequest>,
) -> impl IntoResponse {
    let result = state.registry.merge_external(req.identifier.trim(), &req.product);

    if !result.is_match() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err(result, "lookup result has no usable name".to_string())),
        )
            .into_response();
    }

    let record = ScanRecord::new(state.decoder.decode(&req.identifier), result);
    (StatusCode::OK, Json(ApiResponse::ok(record))).into_response()
}

/// Path segments arrive percent-encoded (GS1 scans contain parentheses and
/// group separators)
fn decode_path(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    env_logger::init();

    println!("🌐 Pharma Scan - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let catalog_path = std::env::var("PHARMA_SCAN_CATALOG").unwrap_or_else(|_| "catalog.csv".to_string());
    let catalog_path = std::path::Path::new(&catalog_path);

    let catalog = if catalog_path.exists() {
        match Catalog::from_csv(catalog_path) {
            Ok(catalog) => catalog,
            Err(e) => {
                eprintln!("❌ {:#}", e);
                std::process::exit(1);
            }
        }
    } else {
        eprintln!("⚠️  Catalog not found at {:?}, starting empty", catalog_path);
        Catalog::new()
    };
    println!("✓ Catalog loaded: {} entries", catalog.len());

    let config = match std::env::var("PHARMA_SCAN_CONFIG") {
        Ok(path) => match ScanConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ {:#}", e);
                std::process::exit(1);
            }
        },
        Err(_) => ScanConfig::default(),
    };
    println!("✓ Expiry warning window: {} days", config.expiry_soon_days);

    // Create shared state
    let state = AppState {
        registry: Arc::new(CatalogRegistry::new(catalog)),
        decoder: Arc::new(Gs1Decoder::from_config(&config)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/catalog", get(catalog_status).post(upsert_entry))
        .route("/catalog/external", post(merge_external))
        .route("/decode/:raw", get(decode_scan))
        .route("/match/:raw", get(match_scan))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   API: http://localhost:3000/api/match/<scan>");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
