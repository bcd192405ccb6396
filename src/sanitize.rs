//! HTML escaping of OCR responses.
//!
//! Every string value in a decoded response is escaped before it reaches a
//! page, so extracted text such as `<script>` renders as text. Keys are left
//! alone: they come from the OCR service's fixed schema, not from the document.

use serde_json::{Map, Value};

/// Which characters are escaped besides `&`, `<` and `>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EscapeMode {
    /// Quotes are left as-is; values are rendered as element text only.
    #[default]
    NonQuoted,
    /// Also escape `"` and `'`, for values placed inside attributes.
    Quoted,
}

/// Escapes HTML-significant characters in `input`.
///
/// Not idempotent: escaping `&lt;` again yields `&amp;lt;`.
pub fn escape_html(input: &str, mode: EscapeMode) -> String {
    let mut out = String::with_capacity(input.len());

    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if mode == EscapeMode::Quoted => out.push_str("&quot;"),
            '\'' if mode == EscapeMode::Quoted => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }

    out
}

/// Returns a copy of `node` with every string leaf escaped.
///
/// Sequence order, map key sets and all non-string scalars are preserved.
pub fn sanitize_with(node: &Value, mode: EscapeMode) -> Value {
    match node {
        Value::String(s) => Value::String(escape_html(s, mode)),
        Value::Array(items) => Value::Array(items.iter().map(|v| sanitize_with(v, mode)).collect()),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key.clone(), sanitize_with(value, mode));
            }
            Value::Object(out)
        }
        Value::Number(_) | Value::Bool(_) | Value::Null => node.clone(),
    }
}

/// Sanitizes a response tree with the default (non-quoted) escaping.
pub fn sanitize(node: &Value) -> Value {
    sanitize_with(node, EscapeMode::default())
}

/// Sanitizes free text, used when an upstream body is not JSON.
pub fn sanitize_text(text: &str) -> String {
    escape_html(text, EscapeMode::default())
}
