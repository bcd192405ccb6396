//! Command-line front-end: sends local documents to the OCR service and prints
//! the projected fields followed by the raw sanitized response.

use clap::Parser;
use datalens_demo::analysis::DocumentAnalyzer;
use datalens_demo::config::Config;
use datalens_demo::documents::UploadedDocument;
use datalens_demo::models::{
    AnalysisOutcome, AnalysisReport, Commodity, CustomerType, DocumentCategory, Language,
    Projection, Selection,
};
use datalens_demo::ocr_client::OcrClient;
use datalens_demo::schema::SchemaRegistry;
use std::path::PathBuf;
use std::sync::Arc;

/// Analyze invoices or identity documents with the DataLens OCR service.
#[derive(Parser, Debug)]
#[command(name = "analyze_document", version)]
struct Cli {
    /// Document category (invoices/id).
    #[arg(long, default_value = "invoices")]
    category: DocumentCategory,
    /// Customer type (residenziale/microbusiness).
    #[arg(long, default_value = "residenziale")]
    customer_type: CustomerType,
    /// Commodity (gas/luce/dual).
    #[arg(long, default_value = "gas")]
    commodity: Commodity,
    /// Response language (it/es). Falls back to DEFAULT_LANGUAGE.
    #[arg(long)]
    language: Option<Language>,
    /// Print the whole report as JSON.
    #[arg(long)]
    json: bool,
    /// Documents to upload.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

impl Cli {
    fn selection(&self, default_language: Language) -> Selection {
        Selection {
            category: self.category,
            customer_type: self.customer_type,
            commodity: self.commodity,
            language: self.language.unwrap_or(default_language),
        }
    }
}

/// Strings are printed without JSON quotes, everything else as compact JSON.
fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Identity documents carry no customer type, so only invoices get a heading.
fn fields_heading(report: &AnalysisReport) -> Option<String> {
    (report.selection.category == DocumentCategory::Invoice)
        .then(|| format!("Fields for {}", report.selection.customer_type))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let mut documents = Vec::with_capacity(cli.paths.len());
    for path in &cli.paths {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        documents.push(UploadedDocument::new(name, bytes));
    }

    let analyzer = DocumentAnalyzer::new(
        OcrClient::new(&config)?,
        Arc::new(SchemaRegistry::builtin()),
    );
    let report = analyzer
        .analyze(cli.selection(config.default_language), &documents)
        .await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match &report.outcome {
        AnalysisOutcome::Projected { projection, data } => {
            if let Some(heading) = fields_heading(&report) {
                println!("=== {} ===\n", heading);
            }
            match projection {
                Projection::Fields { entries } => {
                    for entry in entries {
                        println!("{}: {}", entry.label, display_value(&entry.value));
                    }
                }
                Projection::NothingToDisplay => println!("No fields to display."),
                Projection::NoSchema => println!("No display schema for this selection."),
            }
            println!(
                "\n=== Raw response content (status {}) ===",
                report.upstream_status
            );
            println!("Response time: {}s", report.elapsed_secs);
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        AnalysisOutcome::Undecodable { raw_text } => {
            println!(
                "=== Raw response content (status {}) ===",
                report.upstream_status
            );
            println!("Response time: {}s", report.elapsed_secs);
            println!("{}", raw_text);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_and_language_fallback() {
        let cli = Cli::try_parse_from(["analyze_document", "bolletta.pdf"]).unwrap();
        let selection = cli.selection(Language::Es);

        assert_eq!(selection.category, DocumentCategory::Invoice);
        assert_eq!(selection.customer_type, CustomerType::Residential);
        assert_eq!(selection.commodity, Commodity::Gas);
        assert_eq!(selection.language, Language::Es);
        assert!(!cli.json);
    }

    #[test]
    fn test_options_accept_equals_syntax() {
        let cli = Cli::try_parse_from([
            "analyze_document",
            "--category=id",
            "--customer-type",
            "microbusiness",
            "--commodity=luce",
            "--language=it",
            "--json",
            "front.jpg",
            "back.jpg",
        ])
        .unwrap();

        let selection = cli.selection(Language::Es);
        assert_eq!(selection.category, DocumentCategory::Identity);
        assert_eq!(selection.customer_type, CustomerType::Microbusiness);
        assert_eq!(selection.commodity, Commodity::Power);
        assert_eq!(selection.language, Language::It);
        assert!(cli.json);
        assert_eq!(cli.paths.len(), 2);
    }

    #[test]
    fn test_files_are_required() {
        let err = Cli::try_parse_from(["analyze_document", "--commodity", "dual"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_unknown_commodity_is_rejected() {
        let err =
            Cli::try_parse_from(["analyze_document", "--commodity", "water", "a.pdf"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_identity_output_has_no_customer_heading() {
        let mut report = AnalysisReport {
            request_id: uuid::Uuid::nil(),
            requested_at: chrono::Utc::now(),
            selection: Selection::default(),
            documents: Vec::new(),
            upstream_status: 200,
            elapsed_secs: 0.1,
            outcome: AnalysisOutcome::Projected {
                projection: Projection::NothingToDisplay,
                data: serde_json::json!({}),
            },
        };
        assert_eq!(
            fields_heading(&report).as_deref(),
            Some("Fields for residenziale")
        );

        report.selection.category = DocumentCategory::Identity;
        assert_eq!(fields_heading(&report), None);
    }
}
