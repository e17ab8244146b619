//! JSON/YAML text → [`serde_json::Value`].
//!
//! Tool manifests, resource lists, server configurations and queue messages
//! are all accepted either as JSON or as YAML text. Parsing only produces the
//! generic value tree; structural checks are the validators' job.

use crate::error::{ParseError, ParseErrorKind};
use serde_json::Value;

/// Parse JSON or YAML text into a value of any shape.
///
/// Text whose first non-blank character opens a JSON object or array is read
/// as JSON so that syntax errors carry a line and column. Everything else is
/// read as a single YAML document.
pub fn parse_value(input: &str) -> Result<Value, ParseError> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return Err(ParseError::syntax("empty input"));
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return serde_json::from_str(input).map_err(|e| ParseError {
            kind: classify_json_error(&e),
            message: e.to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
        });
    }

    check_multi_document(input)?;

    serde_saphyr::from_str(input).map_err(|e| {
        let msg = e.to_string();
        ParseError {
            kind: classify_saphyr_error(&msg),
            message: msg,
            line: None,
            column: None,
        }
    })
}

/// Parse JSON or YAML text whose root must be a mapping.
pub fn parse_mapping(input: &str) -> Result<Value, ParseError> {
    let value = parse_value(input)?;
    if !value.is_object() {
        return Err(ParseError {
            kind: ParseErrorKind::TypeMismatch,
            message: format!("document root must be a mapping, found {}", kind_name(&value)),
            line: None,
            column: None,
        });
    }
    Ok(value)
}

/// Read a file and parse it with [`parse_value`].
pub fn parse_file(path: impl AsRef<std::path::Path>) -> Result<Value, ParseError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ParseError {
        kind: ParseErrorKind::Io,
        message: format!("{}: {}", path.display(), e),
        line: None,
        column: None,
    })?;
    parse_value(&text)
}

/// Human-readable JSON type of a value, as used in issue messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Only matches `---` at column 0 to avoid false positives inside block scalars.
fn check_multi_document(input: &str) -> Result<(), ParseError> {
    let mut doc_count = 0;
    for (line_num, line) in input.lines().enumerate() {
        if line.starts_with("---") && line[3..].trim().is_empty() {
            doc_count += 1;
            if doc_count > 1 {
                return Err(ParseError {
                    kind: ParseErrorKind::Syntax,
                    message: "multi-document YAML is not supported".to_string(),
                    line: Some(line_num + 1),
                    column: Some(1),
                });
            }
        }
    }
    Ok(())
}

fn classify_saphyr_error(msg: &str) -> ParseErrorKind {
    let lower = msg.to_lowercase();
    if lower.contains("invalid type") || lower.contains("expected") {
        ParseErrorKind::TypeMismatch
    } else {
        ParseErrorKind::Syntax
    }
}

fn classify_json_error(err: &serde_json::Error) -> ParseErrorKind {
    match err.classify() {
        serde_json::error::Category::Io => ParseErrorKind::Io,
        serde_json::error::Category::Data => ParseErrorKind::TypeMismatch,
        serde_json::error::Category::Syntax | serde_json::error::Category::Eof => {
            ParseErrorKind::Syntax
        }
    }
}
