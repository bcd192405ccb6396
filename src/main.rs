use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use datalens_demo::analysis::DocumentAnalyzer;
use datalens_demo::config::Config;
use datalens_demo::handlers::AppState;
use datalens_demo::ocr_client::OcrClient;
use datalens_demo::routes::{self, RateLimit};
use datalens_demo::schema::SchemaRegistry;

/// Main entry point for the application.
///
/// Initializes logging, configuration, the OCR client and the display
/// schemas, then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "datalens_demo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Schema tables are fixed for the lifetime of the process
    let schemas = Arc::new(SchemaRegistry::builtin());
    tracing::info!("Display schemas loaded");

    let client = OcrClient::new(&config)?;
    tracing::info!("✓ OCR client initialized");

    let app_state = Arc::new(AppState {
        config: config.clone(),
        analyzer: DocumentAnalyzer::new(client, schemas),
    });

    let app = routes::router(app_state, Some(RateLimit::default()))?;

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
