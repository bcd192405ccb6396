use crate::analysis::DocumentAnalyzer;
use crate::config::Config;
use crate::documents::UploadedDocument;
use crate::errors::AppError;
use crate::models::{AnalysisReport, Commodity, CustomerType, Selection};
use crate::render;
use crate::schema::FieldSchema;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// OCR client plus the immutable display schemas.
    pub analyzer: DocumentAnalyzer,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "datalens-demo",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Reads the selection fields and documents from a multipart upload.
///
/// Missing selection fields keep their defaults (invoice, residential, gas,
/// the configured language).
pub async fn read_upload(
    mut multipart: Multipart,
    defaults: Selection,
) -> Result<(Selection, Vec<UploadedDocument>), AppError> {
    let mut selection = defaults;
    let mut documents = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" | "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was picked
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                documents.push(UploadedDocument::new(file_name, bytes.to_vec()));
            }
            "category" => {
                selection.category = field.text().await?.parse().map_err(AppError::BadRequest)?;
            }
            "customer_type" => {
                selection.customer_type =
                    field.text().await?.parse().map_err(AppError::BadRequest)?;
            }
            "commodity" => {
                selection.commodity = field.text().await?.parse().map_err(AppError::BadRequest)?;
            }
            "language" => {
                selection.language = field.text().await?.parse().map_err(AppError::BadRequest)?;
            }
            other => {
                tracing::debug!("Ignoring unknown form field '{}'", other);
            }
        }
    }

    Ok((selection, documents))
}

fn default_selection(state: &AppState) -> Selection {
    Selection {
        language: state.config.default_language,
        ..Selection::default()
    }
}

/// GET /
///
/// Upload form.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render::render_upload_form(state.config.default_language))
}

/// POST /analyze
///
/// Browser form target: runs the analysis and renders the result page.
/// Errors are rendered inside the page rather than as JSON.
pub async fn analyze_form(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let language = state.config.default_language;

    let result = async {
        let (selection, documents) = read_upload(multipart, default_selection(&state)).await?;
        let report = state.analyzer.analyze(selection, &documents).await?;
        Ok::<_, AppError>((report, documents))
    }
    .await;

    match result {
        Ok((report, documents)) => {
            Html(render::render_report(&report, &documents)).into_response()
        }
        Err(e) => {
            let (status, message) = e.status_and_message();
            (status, Html(render::render_error(language, &message))).into_response()
        }
    }
}

/// POST /api/v1/documents/analyze
///
/// Same workflow as the form, returning the report as JSON.
pub async fn analyze_document(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AnalysisReport>, AppError> {
    let (selection, documents) = read_upload(multipart, default_selection(&state)).await?;
    tracing::info!(
        "POST /documents/analyze - category: {}, documents: {}",
        selection.category,
        documents.len()
    );

    let report = state.analyzer.analyze(selection, &documents).await?;
    Ok(Json(report))
}

/// GET /api/v1/schemas/:customer_type/:commodity
///
/// Merged invoice display schema for a selection.
pub async fn get_invoice_schema(
    State(state): State<Arc<AppState>>,
    Path((customer_type, commodity)): Path<(String, String)>,
) -> Result<Json<FieldSchema>, AppError> {
    let customer_type: CustomerType = customer_type.parse().map_err(AppError::NotFound)?;
    let commodity: Commodity = commodity.parse().map_err(AppError::NotFound)?;

    Ok(Json(
        state
            .analyzer
            .schemas()
            .invoice_schema(customer_type, commodity),
    ))
}

/// GET /api/v1/schemas/identity
pub async fn get_identity_schema(State(state): State<Arc<AppState>>) -> Json<FieldSchema> {
    Json(state.analyzer.schemas().identity_schema().clone())
}
