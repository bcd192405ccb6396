//! Uploaded documents and their previews.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::errors::AppError;
use crate::models::DocumentSummary;

pub const PDF: &str = "application/pdf";
pub const JPEG: &str = "image/jpeg";
pub const PNG: &str = "image/png";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Maps a file name to the MIME type sent to the OCR service.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => PDF,
        "jpeg" | "jpg" => JPEG,
        "png" => PNG,
        _ => OCTET_STREAM,
    }
}

/// A document received from the user, held in memory for one request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    /// Wraps an upload, deriving its MIME type from the file name.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name);
        Self {
            name,
            content_type,
            bytes,
        }
    }

    /// Rejects documents the OCR endpoints cannot read.
    pub fn ensure_supported(&self) -> Result<(), AppError> {
        if self.bytes.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Document \"{}\" is empty",
                self.name
            )));
        }
        if self.content_type == OCTET_STREAM {
            return Err(AppError::UnsupportedMediaType(format!(
                "Document \"{}\" must be a PDF, JPEG or PNG file",
                self.name
            )));
        }
        Ok(())
    }

    /// SHA-256 of the document bytes (hex encoded).
    pub fn sha256(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            name: self.name.clone(),
            content_type: self.content_type.to_string(),
            size_bytes: self.bytes.len(),
            sha256: self.sha256(),
        }
    }

    /// Previews to show next to the analysis.
    ///
    /// Images are passed through as a single page. PDFs are not rasterized
    /// here; the browser's own viewer renders them from an embedded data URI.
    pub fn previews(&self) -> Vec<PagePreview> {
        let kind = match self.content_type {
            PDF => PreviewKind::EmbeddedPdf,
            JPEG | PNG => PreviewKind::Image,
            _ => return Vec::new(),
        };

        vec![PagePreview {
            kind,
            data_uri: format!(
                "data:{};base64,{}",
                self.content_type,
                BASE64_STANDARD.encode(&self.bytes)
            ),
        }]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Image,
    EmbeddedPdf,
}

/// Displayable form of (part of) a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePreview {
    pub kind: PreviewKind,
    pub data_uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type_for("bolletta.PDF"), PDF);
        assert_eq!(content_type_for("scan.jpg"), JPEG);
        assert_eq!(content_type_for("scan.JPEG"), JPEG);
        assert_eq!(content_type_for("id.png"), PNG);
        assert_eq!(content_type_for("notes.txt"), OCTET_STREAM);
        assert_eq!(content_type_for("no_extension"), OCTET_STREAM);
    }

    #[test]
    fn test_unsupported_and_empty_documents_rejected() {
        let txt = UploadedDocument::new("notes.txt", b"hello".to_vec());
        assert!(matches!(
            txt.ensure_supported(),
            Err(AppError::UnsupportedMediaType(_))
        ));

        let empty = UploadedDocument::new("bill.pdf", Vec::new());
        assert!(matches!(empty.ensure_supported(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_image_preview_passes_bytes_through() {
        let doc = UploadedDocument::new("front.png", vec![1, 2, 3]);
        let previews = doc.previews();
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].kind, PreviewKind::Image);
        assert_eq!(previews[0].data_uri, "data:image/png;base64,AQID");
    }

    #[test]
    fn test_pdf_preview_is_embedded() {
        let doc = UploadedDocument::new("bill.pdf", b"%PDF-1.4".to_vec());
        assert_eq!(doc.previews()[0].kind, PreviewKind::EmbeddedPdf);
    }

    #[test]
    fn test_summary_fingerprint() {
        let doc = UploadedDocument::new("bill.pdf", b"abc".to_vec());
        let summary = doc.summary();
        assert_eq!(summary.size_bytes, 3);
        assert_eq!(
            summary.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
