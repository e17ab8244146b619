use crate::digest::Checksum;
use crate::error::{Issue, Report, ValidatorError};
use crate::parse::parse_value;
use crate::schema::{self, JsonSchema, SchemaRepository};
use crate::types::ResourceDescriptor;
use crate::validators::{pointer_token, schema_report};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use url::Url;

/// Checks resource lists: unique names, well-formed URLs, and checksums when
/// the resource bytes are at hand.
#[derive(Clone, Debug)]
pub struct OcrdResourceListValidator {
    schema: Arc<JsonSchema>,
}

impl OcrdResourceListValidator {
    pub fn new(repo: &SchemaRepository) -> Result<Self, ValidatorError> {
        Ok(OcrdResourceListValidator {
            schema: repo.json_schema(schema::RESOURCE_LIST)?,
        })
    }

    pub fn builtin() -> Result<Self, ValidatorError> {
        let repo = SchemaRepository::builtin()?;
        Self::new(&repo)
    }

    /// Check a typed list. Declared checksums cannot be verified here and
    /// each yields a `"checksum-unverified"` warning.
    pub fn validate(&self, resources: &[ResourceDescriptor]) -> Report {
        self.validate_with_content(resources, &HashMap::new())
    }

    /// Check a typed list, verifying checksums and sizes of every resource
    /// whose bytes are in `contents` (keyed by resource name).
    pub fn validate_with_content(
        &self,
        resources: &[ResourceDescriptor],
        contents: &HashMap<String, Vec<u8>>,
    ) -> Report {
        check_entries(resources.iter().enumerate(), contents)
    }

    /// Schema check, then the list checks. Accepts a bare list or a mapping
    /// of executable name → list; uniqueness applies per list.
    pub fn validate_value(&self, value: &Value) -> Report {
        let mut report = schema_report(&self.schema, value);
        match value {
            Value::Array(entries) => {
                let list = typed_entries(entries);
                report.extend(check_entries(list.iter().map(|(i, r)| (*i, r)), &HashMap::new()));
            }
            Value::Object(map) => {
                for (executable, entries) in map {
                    let Some(entries) = entries.as_array() else {
                        continue;
                    };
                    let list = typed_entries(entries);
                    let prefix = format!("/{}", pointer_token(executable));
                    report.extend(
                        check_entries(list.iter().map(|(i, r)| (*i, r)), &HashMap::new())
                            .with_pointer_prefix(&prefix),
                    );
                }
            }
            _ => {}
        }
        report
    }

    /// Parse JSON or YAML text, then [`validate_value`](Self::validate_value).
    pub fn validate_str(&self, input: &str) -> Report {
        match parse_value(input) {
            Ok(value) => self.validate_value(&value),
            Err(e) => Report::single(e.into_issue()),
        }
    }
}

/// Entries that deserialize, with their list index. The others were already
/// reported by the schema step.
fn typed_entries(entries: &[Value]) -> Vec<(usize, ResourceDescriptor)> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            serde_json::from_value::<ResourceDescriptor>(v.clone())
                .ok()
                .map(|r| (i, r))
        })
        .collect()
}

fn check_entries<'a>(
    resources: impl Iterator<Item = (usize, &'a ResourceDescriptor)>,
    contents: &HashMap<String, Vec<u8>>,
) -> Report {
    let mut report = Report::new();
    let mut names: HashSet<&str> = HashSet::new();
    let mut count = 0usize;

    for (i, res) in resources {
        count += 1;
        let at = |field: &str| format!("/{}/{}", i, field);

        if !names.insert(res.name.as_str()) {
            report.push(
                Issue::error(
                    "duplicate-resource-name",
                    format!("resource name '{}' is already used by an earlier entry", res.name),
                )
                .at_pointer(at("name")),
            );
        }

        match res.url.as_deref().map(str::trim) {
            None | Some("") => report.push(
                Issue::error(
                    "missing-url",
                    format!("resource '{}' has no url", res.name),
                )
                .at_pointer(at("url")),
            ),
            Some(url) => {
                if let Err(e) = Url::parse(url) {
                    report.push(
                        Issue::error(
                            "invalid-url",
                            format!("url '{}' of resource '{}' is malformed: {}", url, res.name, e),
                        )
                        .at_pointer(at("url")),
                    );
                }
            }
        }

        let content = contents.get(&res.name);

        if let Some(declared) = &res.checksum {
            match declared.parse::<Checksum>() {
                Err(e) => report.push(
                    Issue::error(
                        "invalid-checksum",
                        format!("checksum of resource '{}': {}", res.name, e),
                    )
                    .at_pointer(at("checksum")),
                ),
                Ok(checksum) => match content {
                    Some(bytes) if !checksum.matches(bytes) => report.push(
                        Issue::error(
                            "checksum-mismatch",
                            format!(
                                "resource '{}' has checksum {}, declared {}",
                                res.name,
                                Checksum::of(checksum.algorithm, bytes),
                                checksum
                            ),
                        )
                        .at_pointer(at("checksum")),
                    ),
                    Some(_) => {}
                    None => report.push(
                        Issue::warning(
                            "checksum-unverified",
                            format!(
                                "checksum of resource '{}' not verified: content not supplied",
                                res.name
                            ),
                        )
                        .at_pointer(at("checksum")),
                    ),
                },
            }
        }

        if let (Some(size), Some(bytes)) = (res.size, content)
            && size != bytes.len() as u64
        {
            report.push(
                Issue::error(
                    "size-mismatch",
                    format!(
                        "resource '{}' is {} bytes, declared {}",
                        res.name,
                        bytes.len(),
                        size
                    ),
                )
                .at_pointer(at("size")),
            );
        }
    }

    tracing::debug!(
        validator = "resource-list",
        resources = count,
        issues = report.len(),
        "validated resource list"
    );
    report
}
