use crate::config::Config;
use crate::documents::UploadedDocument;
use crate::errors::{AppError, ResultExt};
use crate::models::Selection;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Longest body excerpt written to debug logs.
const LOG_BODY_LIMIT: usize = 2048;

/// Raw answer of an OCR endpoint, before any decoding.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub elapsed: Duration,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the DataLens OCR endpoints and their OAuth token server.
#[derive(Clone)]
pub struct OcrClient {
    client: reqwest::Client,
    api_key: String,
    api_url_id: String,
    api_url_invoices: String,
    auth_url: String,
    auth_client_id: String,
    auth_client_secret: String,
}

impl OcrClient {
    /// Creates a new `OcrClient` from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create OCR client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_url_id: config.api_url_id.clone(),
            api_url_invoices: config.api_url_invoices.clone(),
            auth_url: config.auth_url.clone(),
            auth_client_id: config.auth_client_id.clone(),
            auth_client_secret: config.auth_client_secret.clone(),
        })
    }

    /// Obtains a bearer token through the OAuth client-credentials grant.
    pub async fn fetch_access_token(&self) -> Result<String, AppError> {
        tracing::info!("Requesting access token from {}", self.auth_url);

        let response = self
            .client
            .post(&self.auth_url)
            .query(&[("grant_type", "client_credentials")])
            .form(&[
                ("client_id", self.auth_client_id.as_str()),
                ("client_secret", self.auth_client_secret.as_str()),
            ])
            .send()
            .await
            .context("Token request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Unauthorized(format!(
                "Token endpoint returned {}: {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::Unauthorized(format!("Token response has no access_token: {}", e))
        })?;

        tracing::debug!("Access token obtained");
        Ok(token.access_token)
    }

    /// Sends one invoice as the raw request body.
    pub async fn analyze_invoice(
        &self,
        document: &UploadedDocument,
        selection: &Selection,
        access_token: &str,
    ) -> Result<UpstreamResponse, AppError> {
        tracing::info!(
            "Sending invoice \"{}\" ({}, {} bytes) to OCR: customer_type={}, commodity={}",
            document.name,
            document.content_type,
            document.bytes.len(),
            selection.customer_type,
            selection.commodity
        );

        let request = self
            .client
            .post(&self.api_url_invoices)
            .header("x-api-key", &self.api_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", document.content_type)
            .header("language", selection.language.as_str())
            .query(&[
                ("commodity", selection.commodity.as_str()),
                ("customer_type", selection.customer_type.as_str()),
            ])
            .body(document.bytes.clone());

        self.execute("invoices", request).await
    }

    /// Sends identity documents as a multipart form, one `files` part each.
    pub async fn analyze_identity(
        &self,
        documents: &[UploadedDocument],
        access_token: &str,
    ) -> Result<UpstreamResponse, AppError> {
        tracing::info!("Sending {} identity document(s) to OCR", documents.len());

        let mut form = Form::new();
        for document in documents {
            let part = Part::bytes(document.bytes.clone())
                .file_name(document.name.clone())
                .mime_str(document.content_type)
                .with_context(|| format!("Invalid MIME type for {}", document.name))?;
            form = form.part("files", part);
        }

        let request = self
            .client
            .post(&self.api_url_id)
            .header("x-api-key", &self.api_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .multipart(form);

        self.execute("id", request).await
    }

    /// Sends a request and returns status, timing and body text.
    ///
    /// Non-success statuses are not errors here: the caller shows them with
    /// the body so the user can see what the service said.
    async fn execute(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<UpstreamResponse, AppError> {
        let request = request
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build request: {}", e)))?;
        let method = request.method().clone();
        let url = request.url().clone();
        let request_headers = redacted_headers(request.headers());

        let started = Instant::now();
        let response = self
            .client
            .execute(request)
            .await
            .with_context(|| format!("OCR {} request failed", endpoint))?;

        let status = response.status();
        let response_headers = redacted_headers(response.headers());
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read OCR {} response", endpoint))?;
        let elapsed = started.elapsed();

        tracing::debug!(
            "\n---------------- request ----------------\n{} {}\n{}\n\n---------------- response ----------------\n{}\n{}\n\n{}",
            method,
            url,
            request_headers,
            status,
            response_headers,
            excerpt(&body)
        );

        if status.is_success() {
            tracing::info!(
                "OCR {} returned {} in {:.3}s",
                endpoint,
                status,
                elapsed.as_secs_f64()
            );
        } else {
            tracing::warn!(
                "OCR {} returned {} in {:.3}s",
                endpoint,
                status,
                elapsed.as_secs_f64()
            );
        }

        Ok(UpstreamResponse {
            status: status.as_u16(),
            elapsed,
            body,
        })
    }
}

/// Formats headers one per line, hiding credentials.
fn redacted_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = match name.as_str() {
                "authorization" | "x-api-key" | "cookie" | "set-cookie" => "[REDACTED]",
                _ => value.to_str().unwrap_or("<binary>"),
            };
            format!("{}: {}", name, shown)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn excerpt(body: &str) -> &str {
    if body.len() <= LOG_BODY_LIMIT {
        return body;
    }
    let mut end = LOG_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
