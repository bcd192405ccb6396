use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Decoded JSON of unknown shape returned by the OCR service.
///
/// `serde_json::Value` is already the closed variant set we need
/// (string, number, boolean, null, array, object). With `preserve_order`
/// enabled, objects keep the upstream key order for the raw view.
pub type ResponseNode = serde_json::Value;

// ============ Selection ============

/// Customer segment the invoice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerType {
    #[serde(rename = "residenziale", alias = "residential")]
    Residential,
    #[serde(rename = "microbusiness")]
    Microbusiness,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::Residential => "residenziale",
            CustomerType::Microbusiness => "microbusiness",
        }
    }
}

impl FromStr for CustomerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "residenziale" | "residential" => Ok(CustomerType::Residential),
            "microbusiness" => Ok(CustomerType::Microbusiness),
            other => Err(format!("unknown customer type '{}'", other)),
        }
    }
}

impl fmt::Display for CustomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing commodity of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Commodity {
    #[serde(rename = "gas")]
    Gas,
    #[serde(rename = "luce", alias = "power")]
    Power,
    #[serde(rename = "dual")]
    Dual,
}

impl Commodity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commodity::Gas => "gas",
            Commodity::Power => "luce",
            Commodity::Dual => "dual",
        }
    }

    pub fn includes_gas(&self) -> bool {
        matches!(self, Commodity::Gas | Commodity::Dual)
    }

    pub fn includes_power(&self) -> bool {
        matches!(self, Commodity::Power | Commodity::Dual)
    }
}

impl FromStr for Commodity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gas" => Ok(Commodity::Gas),
            "luce" | "power" => Ok(Commodity::Power),
            "dual" => Ok(Commodity::Dual),
            other => Err(format!("unknown commodity '{}'", other)),
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which OCR endpoint a document is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentCategory {
    #[serde(rename = "id", alias = "identity")]
    Identity,
    #[serde(rename = "invoices", alias = "invoice")]
    Invoice,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Identity => "id",
            DocumentCategory::Invoice => "invoices",
        }
    }

    /// Identity documents may be sent front and back together.
    pub fn accepts_multiple_files(&self) -> bool {
        matches!(self, DocumentCategory::Identity)
    }
}

impl FromStr for DocumentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "id" | "identity" => Ok(DocumentCategory::Identity),
            "invoices" | "invoice" => Ok(DocumentCategory::Invoice),
            other => Err(format!("unknown document category '{}'", other)),
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language hint forwarded to the invoice endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "it")]
    It,
    #[serde(rename = "es")]
    Es,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::It => "it",
            Language::Es => "es",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "it" => Ok(Language::It),
            "es" => Ok(Language::Es),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

/// Runtime choice made by the user for a single analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub category: DocumentCategory,
    pub customer_type: CustomerType,
    pub commodity: Commodity,
    pub language: Language,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            category: DocumentCategory::Invoice,
            customer_type: CustomerType::Residential,
            commodity: Commodity::Gas,
            language: Language::It,
        }
    }
}

// ============ Projection ============

/// One (label, value) pair destined for human-facing rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayEntry {
    /// Logical key-path the value was resolved from.
    pub key: String,
    pub label: String,
    pub icon: Option<String>,
    pub value: ResponseNode,
}

/// Result of projecting a response onto a display schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// At least one schema field resolved to a displayable value.
    Fields { entries: Vec<DisplayEntry> },
    /// The schema had fields but none of them were present in the response.
    NothingToDisplay,
    /// No schema applies, so nothing could be projected.
    NoSchema,
}

impl Projection {
    pub fn entries(&self) -> &[DisplayEntry] {
        match self {
            Projection::Fields { entries } => entries,
            Projection::NothingToDisplay | Projection::NoSchema => &[],
        }
    }
}

/// What came back from the OCR endpoint, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Body decoded as JSON; `data` is the sanitized tree.
    Projected {
        projection: Projection,
        data: ResponseNode,
    },
    /// Body was not JSON; `raw_text` is the sanitized body text.
    Undecodable { raw_text: String },
}

// ============ Reports ============

/// Summary of one uploaded document, without its bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub content_type: String,
    pub size_bytes: usize,
    /// SHA-256 of the document bytes (hex encoded).
    pub sha256: String,
}

/// Everything the presentation layer needs to render one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub request_id: Uuid,
    pub requested_at: DateTime<Utc>,
    pub selection: Selection,
    pub documents: Vec<DocumentSummary>,
    /// HTTP status returned by the OCR endpoint.
    pub upstream_status: u16,
    /// Upstream round-trip time in seconds.
    pub elapsed_secs: f64,
    #[serde(flatten)]
    pub outcome: AnalysisOutcome,
}
