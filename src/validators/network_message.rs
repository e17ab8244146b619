use crate::enums::MessageKind;
use crate::error::{Issue, Report, ValidatorError};
use crate::parse::parse_mapping;
use crate::schema::{self, JsonSchema, SchemaRepository};
use crate::types::ParameterSpec;
use crate::validators::{ParameterValidator, schema_report};
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use url::Url;

/// `page_id` tokens starting with this are regular expressions.
pub const REGEX_PREFIX: &str = "//";

static PAGE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap());

static RANGE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*?)([0-9]+)$").unwrap());

/// Checks messages exchanged over the processing queues. The `kind` field
/// selects the schema: `job-submission` or `job-result`.
#[derive(Clone, Debug)]
pub struct OcrdNetworkMessageValidator {
    processing: Arc<JsonSchema>,
    result: Arc<JsonSchema>,
    parameters: Option<ParameterValidator>,
}

impl OcrdNetworkMessageValidator {
    pub fn new(repo: &SchemaRepository) -> Result<Self, ValidatorError> {
        Ok(OcrdNetworkMessageValidator {
            processing: repo.json_schema(schema::MESSAGE_PROCESSING)?,
            result: repo.json_schema(schema::MESSAGE_RESULT)?,
            parameters: None,
        })
    }

    pub fn builtin() -> Result<Self, ValidatorError> {
        let repo = SchemaRepository::builtin()?;
        Self::new(&repo)
    }

    /// Also check a job submission's `parameters` against `spec`.
    pub fn with_parameter_spec(mut self, spec: ParameterSpec) -> Self {
        self.parameters = Some(ParameterValidator::new(spec));
        self
    }

    pub fn validate(&self, message: &Value) -> Report {
        let kind = message
            .get("kind")
            .and_then(Value::as_str)
            .and_then(MessageKind::from_name);

        let mut report = match kind {
            Some(MessageKind::JobSubmission) => schema_report(&self.processing, message),
            Some(MessageKind::JobResult) => schema_report(&self.result, message),
            None => {
                let found = match message.get("kind") {
                    Some(v) => v.to_string(),
                    None => "nothing".to_string(),
                };
                Report::single(
                    Issue::error(
                        "unknown-message-kind",
                        format!(
                            "'kind' must be \"job-submission\" or \"job-result\", found {}",
                            found
                        ),
                    )
                    .at_pointer("/kind"),
                )
            }
        };

        check_correlation_id(message, &mut report);
        check_result_references(message, &mut report);
        if kind == Some(MessageKind::JobSubmission) {
            check_workspace_reference(message, &mut report);
            check_page_ids(message, &mut report);
            if let Some(validator) = &self.parameters {
                let parameters = message
                    .get("parameters")
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Default::default()));
                report.extend(
                    validator
                        .validate_value(&parameters)
                        .with_pointer_prefix("/parameters"),
                );
            }
        }

        tracing::debug!(
            validator = "network-message",
            kind = ?kind,
            errors = report.errors().count(),
            "validated message"
        );
        report
    }

    /// Parse JSON or YAML text, then [`validate`](Self::validate).
    pub fn validate_str(&self, input: &str) -> Report {
        match parse_mapping(input) {
            Ok(message) => self.validate(&message),
            Err(e) => Report::single(e.into_issue()),
        }
    }
}

fn check_correlation_id(message: &Value, report: &mut Report) {
    let present = message
        .get("job_id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.trim().is_empty());
    if !present {
        report.push(
            Issue::error("missing-correlation-id", "message has no non-empty job_id")
                .at_pointer("/job_id"),
        );
    }
}

fn check_result_references(message: &Value, report: &mut Report) {
    if let Some(path) = message.get("path_to_mets").and_then(Value::as_str)
        && !is_well_formed_path(path)
    {
        report.push(
            Issue::error(
                "malformed-result-reference",
                format!("path_to_mets '{}' is not a well-formed path", path),
            )
            .at_pointer("/path_to_mets"),
        );
    }
    for field in ["callback_url", "internal_callback_url"] {
        let Some(url) = message.get(field).and_then(Value::as_str) else {
            continue;
        };
        let problem = match Url::parse(url) {
            Err(e) => Some(e.to_string()),
            Ok(u) if !matches!(u.scheme(), "http" | "https") => {
                Some(format!("scheme '{}' is not http or https", u.scheme()))
            }
            Ok(u) if u.host().is_none() => Some("no host".to_string()),
            Ok(_) => None,
        };
        if let Some(problem) = problem {
            report.push(
                Issue::error(
                    "malformed-result-reference",
                    format!("{} '{}' is malformed: {}", field, url, problem),
                )
                .at_pointer(format!("/{}", field)),
            );
        }
    }
}

fn is_well_formed_path(path: &str) -> bool {
    if path.trim().is_empty() || path.chars().any(char::is_control) {
        return false;
    }
    if path.contains("://") {
        return Url::parse(path).is_ok();
    }
    true
}

/// Exactly one of `path_to_mets` and `workspace_id` must be given.
fn check_workspace_reference(message: &Value, report: &mut Report) {
    let given = |field: &str| {
        message
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    };
    if given("path_to_mets") == given("workspace_id") {
        report.push(Issue::error(
            "ambiguous-workspace-reference",
            "either 'path_to_mets' or 'workspace_id' must be provided, but not both",
        ));
    }
}

fn check_page_ids(message: &Value, report: &mut Report) {
    let Some(page_id) = message.get("page_id").and_then(Value::as_str) else {
        return;
    };
    if page_id.is_empty() {
        return;
    }
    for token in page_id.split(',') {
        if let Err(problem) = check_page_id_token(token) {
            report.push(
                Issue::error(
                    "invalid-page-id",
                    format!("page_id token '{}': {}", token, problem),
                )
                .at_pointer("/page_id"),
            );
        }
    }
}

fn check_page_id_token(token: &str) -> Result<(), String> {
    if let Some(pattern) = token.strip_prefix(REGEX_PREFIX) {
        return Regex::new(pattern)
            .map(|_| ())
            .map_err(|e| format!("invalid regular expression: {}", e));
    }
    if let Some((start, end)) = token.split_once("..") {
        let (Some(s), Some(e)) = (RANGE_END_RE.captures(start), RANGE_END_RE.captures(end)) else {
            return Err("range ends must carry a numeric suffix".to_string());
        };
        if s[1] != e[1] {
            return Err(format!("range ends have different prefixes '{}' and '{}'", &s[1], &e[1]));
        }
        let (from, to) = (s[2].parse::<u64>(), e[2].parse::<u64>());
        return match (from, to) {
            (Ok(from), Ok(to)) if from <= to => Ok(()),
            (Ok(_), Ok(_)) => Err("range is descending".to_string()),
            _ => Err("range suffix is too large".to_string()),
        };
    }
    if PAGE_ID_RE.is_match(token) {
        Ok(())
    } else {
        Err("not a valid page id".to_string())
    }
}
