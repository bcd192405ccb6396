//! HTML pages for the browser demo.
//!
//! Response values arrive already sanitized, so they are written as-is.
//! Everything else that originates from the user or the upstream (file names,
//! object keys, error text) is escaped here.

use serde_json::Value;
use std::fmt::Write;

use crate::documents::{PreviewKind, UploadedDocument};
use crate::models::{
    AnalysisOutcome, AnalysisReport, Commodity, CustomerType, DocumentCategory, Language,
    Projection, Selection,
};
use crate::sanitize::{escape_html, EscapeMode};

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; display: flex; }
aside { width: 280px; padding: 1.5rem; background: #f0f2f6; min-height: 100vh; }
main { flex: 1; padding: 1.5rem; display: flex; gap: 2rem; }
main > section { flex: 1; min-width: 0; }
label { display: block; margin-top: 1rem; font-weight: bold; }
.field h4 { margin: 1rem 0 0.25rem; }
.empty { color: #777; font-style: italic; }
.json ul { list-style: none; padding-left: 1.2rem; margin: 0; }
.json .key { color: #8a3ffc; }
.preview img, .preview iframe { max-width: 100%; border: 1px solid #ddd; }
.error { color: #b00020; }
"#;

fn escape(text: &str) -> String {
    escape_html(text, EscapeMode::Quoted)
}

fn page(title: &str, sidebar: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
<aside>{sidebar}</aside>
<main>{content}</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn option<T: PartialEq>(value: &str, item: T, current: T, attribute: &str) -> String {
    let marker = if item == current { attribute } else { "" };
    format!(r#"value="{}"{}"#, value, marker)
}

/// Sidebar form, pre-filled with `current`.
fn request_form(current: &Selection) -> String {
    let category = |c: DocumentCategory| option(c.as_str(), c, current.category, " checked");
    let customer = |c: CustomerType| option(c.as_str(), c, current.customer_type, " checked");
    let commodity = |c: Commodity| option(c.as_str(), c, current.commodity, " selected");
    let language = |l: Language| option(l.as_str(), l, current.language, " selected");

    format!(
        r#"<h2>Configure Request ⚙️</h2>
<form action="/analyze" method="post" enctype="multipart/form-data">
    <label>Document type:</label>
    <input type="radio" name="category" {invoices}> Invoice
    <input type="radio" name="category" {id}> Identity document
    <label>Select customer type:</label>
    <input type="radio" name="customer_type" {residential}> residenziale
    <input type="radio" name="customer_type" {microbusiness}> microbusiness
    <label for="commodity">Commodity:</label>
    <select id="commodity" name="commodity">
        <option {gas}>gas</option>
        <option {power}>luce</option>
        <option {dual}>dual</option>
    </select>
    <label for="language">Language:</label>
    <select id="language" name="language">
        <option {it}>it</option>
        <option {es}>es</option>
    </select>
    <label for="files">Choose a file:</label>
    <input id="files" type="file" name="files" accept=".pdf,.jpeg,.jpg,.png" multiple>
    <p><button type="submit">Call the API</button></p>
</form>"#,
        invoices = category(DocumentCategory::Invoice),
        id = category(DocumentCategory::Identity),
        residential = customer(CustomerType::Residential),
        microbusiness = customer(CustomerType::Microbusiness),
        gas = commodity(Commodity::Gas),
        power = commodity(Commodity::Power),
        dual = commodity(Commodity::Dual),
        it = language(Language::It),
        es = language(Language::Es),
    )
}

fn default_form(default_language: Language) -> String {
    request_form(&Selection {
        language: default_language,
        ..Selection::default()
    })
}

/// Landing page with the upload form.
pub fn render_upload_form(default_language: Language) -> String {
    page(
        "DataLens Demo Web",
        &default_form(default_language),
        "<section><h1>Check document with the DataLens solution 🔎</h1>\
         <p>Upload a PDF, JPEG or PNG document and call the API.</p></section>",
    )
}

/// Page shown when the request could not be completed.
pub fn render_error(default_language: Language, message: &str) -> String {
    page(
        "DataLens Demo Web",
        &default_form(default_language),
        &format!(
            r#"<section><h2>Response</h2><p class="error">{}</p></section>"#,
            escape(message)
        ),
    )
}

fn render_documents(out: &mut String, documents: &[UploadedDocument]) {
    out.push_str("<section><h2>Uploaded documents</h2>");
    for document in documents {
        let _ = write!(
            out,
            "<p>Document \"{}\" ({})</p>",
            escape(&document.name),
            document.content_type
        );
        for preview in document.previews() {
            let _ = match preview.kind {
                PreviewKind::Image => write!(
                    out,
                    r#"<div class="preview"><img src="{}" alt="{}"></div>"#,
                    preview.data_uri,
                    escape(&document.name)
                ),
                PreviewKind::EmbeddedPdf => write!(
                    out,
                    r#"<div class="preview"><iframe src="{}" width="700" height="1000" type="application/pdf"></iframe></div>"#,
                    preview.data_uri
                ),
            };
        }
    }
    out.push_str("</section>");
}

/// Text of a display value. Strings are already escaped.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => escape(&other.to_string()),
    }
}

/// Renders a sanitized JSON tree as nested lists.
///
/// Keys are escaped here because the sanitizer leaves them untouched.
pub fn render_json_tree(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            out.push_str("{<ul>");
            for (key, item) in map {
                let _ = write!(out, r#"<li><span class="key">"{}"</span>: "#, escape(key));
                render_json_tree(out, item);
                out.push_str("</li>");
            }
            out.push_str("</ul>}");
        }
        Value::Array(items) => {
            out.push_str("[<ul>");
            for item in items {
                out.push_str("<li>");
                render_json_tree(out, item);
                out.push_str("</li>");
            }
            out.push_str("</ul>]");
        }
        Value::String(s) => {
            let _ = write!(out, "\"{}\"", s);
        }
        other => out.push_str(&other.to_string()),
    }
}

fn render_projection(out: &mut String, report: &AnalysisReport, projection: &Projection) {
    // Identity documents carry no customer type
    if report.selection.category == DocumentCategory::Invoice {
        let _ = write!(
            out,
            "<h3>Fields for {}</h3>",
            report.selection.customer_type
        );
    }
    match projection {
        Projection::Fields { entries } => {
            for entry in entries {
                let icon = entry.icon.as_deref().unwrap_or("");
                let _ = write!(
                    out,
                    r#"<div class="field"><h4>{} {}</h4><div>{}</div></div>"#,
                    entry.label,
                    icon,
                    display_value(&entry.value)
                );
            }
        }
        Projection::NothingToDisplay => {
            out.push_str(r#"<p class="empty">No fields to display.</p>"#);
        }
        Projection::NoSchema => {
            out.push_str(r#"<p class="empty">No display schema for this selection.</p>"#);
        }
    }
}

/// Result page for one analysis.
///
/// The sidebar form keeps the selection the report was produced with.
pub fn render_report(report: &AnalysisReport, documents: &[UploadedDocument]) -> String {
    let mut content = String::new();
    render_documents(&mut content, documents);

    content.push_str("<section><h2>Response</h2>");
    if let AnalysisOutcome::Projected { projection, .. } = &report.outcome {
        render_projection(&mut content, report, projection);
    }

    let _ = write!(
        content,
        "<h3>Raw response content (status {}):</h3><p>Response time: {}s</p>",
        report.upstream_status, report.elapsed_secs
    );
    match &report.outcome {
        AnalysisOutcome::Projected { data, .. } => {
            content.push_str(r#"<div class="json">"#);
            render_json_tree(&mut content, data);
            content.push_str("</div>");
        }
        AnalysisOutcome::Undecodable { raw_text } => {
            let _ = write!(content, "<pre>{}</pre>", raw_text);
        }
    }
    let _ = write!(
        content,
        r#"<p class="empty">Request {}</p></section>"#,
        report.request_id
    );

    page("DataLens Demo Web", &request_form(&report.selection), &content)
}
