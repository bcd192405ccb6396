//! Projects a sanitized response onto a display schema.

use serde_json::Value;

use crate::models::{DisplayEntry, Projection};
use crate::schema::FieldSchema;

/// Separator between segments of a key-path such as `output_data.name`.
pub const KEY_PATH_SEPARATOR: char = '.';

/// Resolves a key-path against a response tree.
///
/// Walks objects segment by segment. A missing key, or a non-object value
/// before the last segment, yields `None`.
pub fn resolve<'a>(node: &'a Value, key_path: &str, separator: char) -> Option<&'a Value> {
    key_path
        .split(separator)
        .try_fold(node, |current, segment| current.as_object()?.get(segment))
}

/// Null and empty strings carry no information for display. `0` and `false` do.
fn is_displayable(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Builds display entries for every schema field present in `response`,
/// in schema order.
pub fn project(schema: &FieldSchema, response: &Value, separator: char) -> Projection {
    if schema.is_empty() {
        return Projection::NoSchema;
    }

    let entries: Vec<DisplayEntry> = schema
        .iter()
        .filter_map(|field| {
            let value = resolve(response, field.key, separator)?;
            if !is_displayable(value) {
                tracing::trace!("Skipping empty field '{}'", field.key);
                return None;
            }
            Some(DisplayEntry {
                key: field.key.to_string(),
                label: field.display_label(),
                icon: field.icon().map(str::to_string),
                value: value.clone(),
            })
        })
        .collect();

    if entries.is_empty() {
        Projection::NothingToDisplay
    } else {
        Projection::Fields { entries }
    }
}

/// Like [`project`], but resolves keys relative to the subtree at `root`.
///
/// A missing root behaves as an empty object.
pub fn project_at(
    schema: &FieldSchema,
    response: &Value,
    root: Option<&str>,
    separator: char,
) -> Projection {
    let empty = Value::Object(serde_json::Map::new());
    let base = match root {
        Some(path) => resolve(response, path, separator).unwrap_or(&empty),
        None => response,
    };
    project(schema, base, separator)
}
