/// Document analysis workflow shared by the HTML pages, the JSON API and the CLI.
///
/// 1. Validate the uploaded documents against the selected endpoint
/// 2. Obtain an access token
/// 3. Send the documents to the OCR endpoint
/// 4. Sanitize and project the response, or fall back to its raw text
use crate::documents::UploadedDocument;
use crate::errors::{AppError, ResultExt};
use crate::models::{AnalysisOutcome, AnalysisReport, DocumentCategory, ResponseNode, Selection};
use crate::ocr_client::OcrClient;
use crate::projector::{project_at, KEY_PATH_SEPARATOR};
use crate::sanitize::{sanitize, sanitize_text};
use crate::schema::SchemaRegistry;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Turns an upstream body into something displayable.
///
/// JSON bodies are sanitized and projected onto the selection's schema.
/// Anything else is returned as sanitized text.
pub fn interpret_response(
    schemas: &SchemaRegistry,
    selection: &Selection,
    body: &str,
) -> AnalysisOutcome {
    let decoded: ResponseNode = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("OCR response is not valid JSON ({}), showing raw text", e);
            return AnalysisOutcome::Undecodable {
                raw_text: sanitize_text(body),
            };
        }
    };

    let data = sanitize(&decoded);
    let (schema, root) = schemas.plan_for(selection);
    let projection = project_at(&schema, &data, root, KEY_PATH_SEPARATOR);

    tracing::debug!(
        "Projected {} of {} schema field(s)",
        projection.entries().len(),
        schema.len()
    );

    AnalysisOutcome::Projected { projection, data }
}

/// Checks that the document set fits the selected endpoint.
pub fn validate_documents(
    category: DocumentCategory,
    documents: &[UploadedDocument],
) -> Result<(), AppError> {
    if documents.is_empty() {
        return Err(AppError::BadRequest(
            "Please upload at least one file before calling the API.".to_string(),
        ));
    }
    if documents.len() > 1 && !category.accepts_multiple_files() {
        return Err(AppError::BadRequest(format!(
            "The {} endpoint accepts a single document, got {}",
            category,
            documents.len()
        )));
    }
    for document in documents {
        document.ensure_supported()?;
    }
    Ok(())
}

/// Runs documents through the OCR service and prepares the result for display.
#[derive(Clone)]
pub struct DocumentAnalyzer {
    client: OcrClient,
    schemas: Arc<SchemaRegistry>,
}

impl DocumentAnalyzer {
    pub fn new(client: OcrClient, schemas: Arc<SchemaRegistry>) -> Self {
        Self { client, schemas }
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub async fn analyze(
        &self,
        selection: Selection,
        documents: &[UploadedDocument],
    ) -> Result<AnalysisReport, AppError> {
        let request_id = Uuid::new_v4();
        let requested_at = Utc::now();

        validate_documents(selection.category, documents)?;

        let summaries: Vec<_> = documents.iter().map(UploadedDocument::summary).collect();
        for summary in &summaries {
            tracing::info!(
                "[{}] Document \"{}\" ({}, sha256 {})",
                request_id,
                summary.name,
                summary.content_type,
                &summary.sha256[..12]
            );
        }
        tracing::info!("[{}] Calling the {} API", request_id, selection.category);

        let access_token = self
            .client
            .fetch_access_token()
            .await
            .context("Authorizing OCR request")?;

        let upstream = match selection.category {
            DocumentCategory::Invoice => {
                self.client
                    .analyze_invoice(&documents[0], &selection, &access_token)
                    .await?
            }
            DocumentCategory::Identity => {
                self.client
                    .analyze_identity(documents, &access_token)
                    .await?
            }
        };

        let outcome = interpret_response(&self.schemas, &selection, &upstream.body);

        tracing::info!(
            "[{}] Analysis complete: status {}, {:.3}s",
            request_id,
            upstream.status,
            upstream.elapsed.as_secs_f64()
        );

        Ok(AnalysisReport {
            request_id,
            requested_at,
            selection,
            documents: summaries,
            upstream_status: upstream.status,
            elapsed_secs: upstream.elapsed.as_secs_f64(),
            outcome,
        })
    }
}
