use crate::error::{Issue, Report, ValidatorError};
use crate::parse::parse_mapping;
use crate::schema::{self, JsonSchema, SchemaRepository};
use crate::types::ParameterSpec;
use crate::validators::{ParameterValidator, pointer_token, schema_report};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Checks tool manifests (`ocrd-tool.json`).
#[derive(Clone, Debug)]
pub struct OcrdToolValidator {
    schema: Arc<JsonSchema>,
}

impl OcrdToolValidator {
    pub fn new(repo: &SchemaRepository) -> Result<Self, ValidatorError> {
        Ok(OcrdToolValidator {
            schema: repo.json_schema(schema::OCRD_TOOL)?,
        })
    }

    pub fn builtin() -> Result<Self, ValidatorError> {
        let repo = SchemaRepository::builtin()?;
        Self::new(&repo)
    }

    pub fn validate(&self, manifest: &Value) -> Report {
        let mut report = schema_report(&self.schema, manifest);

        if let Some(tools) = manifest.get("tools").and_then(Value::as_object) {
            check_parameter_defaults(tools, &mut report);
            check_unique_executables(tools, &mut report);
        }

        tracing::debug!(
            validator = "ocrd-tool",
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            "validated tool manifest"
        );
        report
    }

    /// Parse JSON or YAML text, then [`validate`](Self::validate).
    pub fn validate_str(&self, input: &str) -> Report {
        match parse_mapping(input) {
            Ok(manifest) => self.validate(&manifest),
            Err(e) => Report::single(e.into_issue()),
        }
    }
}

fn check_parameter_defaults(tools: &serde_json::Map<String, Value>, report: &mut Report) {
    for (key, tool) in tools {
        let Some(parameters) = tool.get("parameters") else {
            continue;
        };
        // Malformed declarations were already reported by the schema step.
        let Ok(spec) = ParameterSpec::from_value(parameters) else {
            continue;
        };
        let prefix = format!("/tools/{}/parameters", pointer_token(key));
        report.extend(
            ParameterValidator::new(spec)
                .check_defaults()
                .with_pointer_prefix(&prefix),
        );
    }
}

fn check_unique_executables(tools: &serde_json::Map<String, Value>, report: &mut Report) {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (key, tool) in tools {
        let Some(executable) = tool.get("executable").and_then(Value::as_str) else {
            continue;
        };
        let pointer = format!("/tools/{}/executable", pointer_token(key));
        if executable != key {
            report.push(
                Issue::warning(
                    "executable-key-mismatch",
                    format!("tool '{}' declares executable '{}'", key, executable),
                )
                .at_pointer(pointer.clone()),
            );
        }
        if let Some(first) = seen.get(executable) {
            report.push(
                Issue::error(
                    "duplicate-executable",
                    format!(
                        "executable '{}' of tool '{}' is already declared by tool '{}'",
                        executable, key, first
                    ),
                )
                .at_pointer(pointer),
            );
        } else {
            seen.insert(executable, key);
        }
    }
}
