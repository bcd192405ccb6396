use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers::{self, AppState};

/// Largest accepted upload (all documents of one request together).
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Per-client request rate for the endpoints that reach the OCR service.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub per_second: u64,
    pub burst_size: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            per_second: 2,
            burst_size: 5,
        }
    }
}

/// Builds the application router.
///
/// `/health` bypasses rate limiting. Without a `rate_limit` no limiter is
/// installed, which is what in-process tests use since they carry no client IP.
pub fn router(state: Arc<AppState>, rate_limit: Option<RateLimit>) -> anyhow::Result<Router> {
    let mut protected_routes = Router::new()
        // Browser demo
        .route("/", get(handlers::index))
        .route("/analyze", post(handlers::analyze_form))
        // JSON API
        .route(
            "/api/v1/documents/analyze",
            post(handlers::analyze_document),
        )
        .route(
            "/api/v1/schemas/identity",
            get(handlers::get_identity_schema),
        )
        .route(
            "/api/v1/schemas/:customer_type/:commodity",
            get(handlers::get_invoice_schema),
        )
        .layer(
            ServiceBuilder::new()
                // Multipart extraction has its own (smaller) default limit
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
                .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES)),
        );

    if let Some(limit) = rate_limit {
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(limit.per_second)
                .burst_size(limit.burst_size)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?,
        );
        protected_routes = protected_routes.layer(GovernorLayer {
            config: governor_conf,
        });
    }

    Ok(Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
