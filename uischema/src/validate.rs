//! Schema validator: recursive descent over arbitrary parsed JSON.
//!
//! DESIGN
//! ======
//! One validator function per element kind, dispatched on the `type`
//! discriminant. Traversal is fail-fast: the first violation stops the walk
//! and is reported with its path from the root (`0.children.1.name`).
//! Keys not named by an element kind are ignored and dropped. Optional
//! fields must be absent or of the right type; `null` is rejected.

use serde_json::{Map, Value};

use crate::element::{Element, ElementKind, UiSchema};

/// Longest accepted UI name, in characters.
pub const MAX_NAME_LEN: usize = 100;

const MSG_EMPTY_SCHEMA: &str = "Schema must contain at least one element";
const MSG_TYPE_REQUIRED: &str = "Element type is required";
const MSG_INPUT_NAME_REQUIRED: &str = "Input name is required";
const MSG_BUTTON_LABEL_REQUIRED: &str = "Button label is required";
const MSG_SCHEMA_REQUIRED: &str = "Schema is required";
const MSG_NAME_REQUIRED: &str = "UI name is required";
const MSG_NAME_TOO_LONG: &str = "UI name must be less than 100 characters";
const MSG_NAME_CHARSET: &str = "UI name can only contain alphanumeric characters, hyphens, and underscores";

// =============================================================================
// ERROR
// =============================================================================

/// First structural violation found, with its location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", display_error(.path, .message))]
pub struct ValidationError {
    /// Dot-joined path from the root; empty for the root itself.
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn at(path: &[Segment], message: impl Into<String>) -> Self {
        Self { path: join_path(path), message: message.into() }
    }

    /// Re-root this error under `prefix` (e.g. `schema` or `uiName`).
    #[must_use]
    pub fn under(mut self, prefix: &str) -> Self {
        self.path = if self.path.is_empty() { prefix.to_owned() } else { format!("{prefix}.{}", self.path) };
        self
    }
}

fn display_error(path: &str, message: &str) -> String {
    if path.is_empty() { message.to_owned() } else { format!("{path}: {message}") }
}

#[derive(Debug, Clone, Copy)]
enum Segment {
    Index(usize),
    Key(&'static str),
}

fn join_path(path: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in path.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        match segment {
            Segment::Index(index) => out.push_str(&index.to_string()),
            Segment::Key(key) => out.push_str(key),
        }
    }
    out
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(kind: &str, got: &Value) -> String {
    format!("Expected {kind}, received {}", json_kind(got))
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Validate a parsed JSON value as a UI schema.
///
/// # Errors
///
/// Returns the first violation encountered: a non-array or empty root, an
/// element that is not an object or carries an unknown `type`, or a missing,
/// empty, or mistyped field.
pub fn validate(raw: &Value) -> Result<UiSchema, ValidationError> {
    let mut path = Vec::new();
    let Value::Array(items) = raw else {
        return Err(ValidationError::at(&path, expected("array", raw)));
    };
    if items.is_empty() {
        return Err(ValidationError::at(&path, MSG_EMPTY_SCHEMA));
    }
    let elements = validate_elements(items, &mut path)?;
    Ok(UiSchema::from_validated(elements))
}

/// Validate a UI name: non-empty, at most [`MAX_NAME_LEN`] characters, and
/// only ASCII letters, digits, `-` and `_`.
///
/// # Errors
///
/// Returns a root-level error describing the first rule the name breaks.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::at(&[], MSG_NAME_REQUIRED));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::at(&[], MSG_NAME_TOO_LONG));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ValidationError::at(&[], MSG_NAME_CHARSET));
    }
    Ok(())
}

/// Validate a `{uiName, schema}` save request body. The name is checked
/// before the schema.
///
/// # Errors
///
/// Returns the first violation, rooted at `uiName` or `schema`.
pub fn validate_save_request(body: &Value) -> Result<(String, UiSchema), ValidationError> {
    let Value::Object(fields) = body else {
        return Err(ValidationError::at(&[], expected("object", body)));
    };

    let name = match fields.get("uiName") {
        None => return Err(ValidationError::at(&[], MSG_NAME_REQUIRED).under("uiName")),
        Some(Value::String(name)) => name,
        Some(other) => return Err(ValidationError::at(&[], expected("string", other)).under("uiName")),
    };
    validate_name(name).map_err(|e| e.under("uiName"))?;

    let Some(raw_schema) = fields.get("schema") else {
        return Err(ValidationError::at(&[], MSG_SCHEMA_REQUIRED).under("schema"));
    };
    let schema = validate(raw_schema).map_err(|e| e.under("schema"))?;

    Ok((name.clone(), schema))
}

// =============================================================================
// RECURSIVE DESCENT
// =============================================================================

fn validate_elements(items: &[Value], path: &mut Vec<Segment>) -> Result<Vec<Element>, ValidationError> {
    let mut elements = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        path.push(Segment::Index(index));
        elements.push(validate_element(item, path)?);
        path.pop();
    }
    Ok(elements)
}

fn validate_element(raw: &Value, path: &mut Vec<Segment>) -> Result<Element, ValidationError> {
    let Value::Object(fields) = raw else {
        return Err(ValidationError::at(path, expected("object", raw)));
    };

    path.push(Segment::Key("type"));
    let Some(tag) = fields.get("type") else {
        return Err(ValidationError::at(path, MSG_TYPE_REQUIRED));
    };
    let Some(kind) = tag.as_str().and_then(ElementKind::from_tag) else {
        let message = format!("Invalid element type {tag}, expected \"div\" | \"input\" | \"button\"");
        return Err(ValidationError::at(path, message));
    };
    path.pop();

    match kind {
        ElementKind::Container => validate_container(fields, path),
        ElementKind::TextInput => validate_text_input(fields, path),
        ElementKind::Button => validate_button(fields, path),
    }
}

fn validate_container(fields: &Map<String, Value>, path: &mut Vec<Segment>) -> Result<Element, ValidationError> {
    let header = optional_string(fields, "header", path)?;

    let children = match fields.get("children") {
        None => None,
        Some(Value::Array(items)) => {
            path.push(Segment::Key("children"));
            let children = validate_elements(items, path)?;
            path.pop();
            Some(children)
        }
        Some(other) => {
            path.push(Segment::Key("children"));
            return Err(ValidationError::at(path, expected("array", other)));
        }
    };

    Ok(Element::Container { header, children })
}

fn validate_text_input(fields: &Map<String, Value>, path: &mut Vec<Segment>) -> Result<Element, ValidationError> {
    let name = required_string(fields, "name", MSG_INPUT_NAME_REQUIRED, path)?;
    let placeholder = optional_string(fields, "placeholder", path)?;
    Ok(Element::TextInput { name, placeholder })
}

fn validate_button(fields: &Map<String, Value>, path: &mut Vec<Segment>) -> Result<Element, ValidationError> {
    let label = required_string(fields, "label", MSG_BUTTON_LABEL_REQUIRED, path)?;
    Ok(Element::Button { label })
}

// =============================================================================
// FIELD HELPERS
// =============================================================================

fn optional_string(
    fields: &Map<String, Value>,
    key: &'static str,
    path: &mut Vec<Segment>,
) -> Result<Option<String>, ValidationError> {
    match fields.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => {
            path.push(Segment::Key(key));
            Err(ValidationError::at(path, expected("string", other)))
        }
    }
}

/// Absent and empty strings both report `missing`.
fn required_string(
    fields: &Map<String, Value>,
    key: &'static str,
    missing: &str,
    path: &mut Vec<Segment>,
) -> Result<String, ValidationError> {
    match fields.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) | None => {
            path.push(Segment::Key(key));
            Err(ValidationError::at(path, missing))
        }
        Some(other) => {
            path.push(Segment::Key(key));
            Err(ValidationError::at(path, expected("string", other)))
        }
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
