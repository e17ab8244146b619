//! [`Report`] → JSON / YAML / XML.

use crate::error::{Location, Report, SerializeError};
use quick_xml::escape::escape;
use std::fmt::Write as _;

/// Serialize a report to pretty-printed JSON in the `{valid, issues}` shape.
pub fn to_json(report: &Report) -> Result<String, SerializeError> {
    serde_json::to_string_pretty(report).map_err(|e| SerializeError {
        message: format!("failed to serialize report to JSON: {}", e),
    })
}

/// Serialize a report to YAML in the `{valid, issues}` shape.
pub fn to_yaml(report: &Report) -> Result<String, SerializeError> {
    // Go through a JSON value first so the field order matches to_json.
    let value = serde_json::to_value(report).map_err(|e| SerializeError {
        message: format!("failed to convert report to JSON value: {}", e),
    })?;

    serde_saphyr::to_string(&value).map_err(|e| SerializeError {
        message: format!("failed to serialize report to YAML: {}", e),
    })
}

/// Serialize a report to XML:
///
/// ```text
/// <report valid="false">
///   <error category="xsd:mets" line="3" column="5">message</error>
/// </report>
/// ```
pub fn to_xml(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, r#"<report valid="{}">"#, report.is_valid());
    for issue in report.issues() {
        let tag = issue.severity.to_string();
        let _ = write!(out, r#"  <{} category="{}""#, tag, escape(issue.category.as_str()));
        if let Some(loc) = &issue.location {
            write_location(&mut out, loc);
        }
        let _ = writeln!(out, ">{}</{}>", escape(issue.message.as_str()), tag);
    }
    out.push_str("</report>\n");
    out
}

fn write_location(out: &mut String, loc: &Location) {
    if let Some(file) = &loc.file {
        let _ = write!(out, r#" file="{}""#, escape(file.as_str()));
    }
    if let Some(line) = loc.line {
        let _ = write!(out, r#" line="{}""#, line);
    }
    if let Some(column) = loc.column {
        let _ = write!(out, r#" column="{}""#, column);
    }
    if let Some(pointer) = &loc.pointer {
        let _ = write!(out, r#" pointer="{}""#, escape(pointer.as_str()));
    }
}
