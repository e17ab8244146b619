use crate::enums::ParameterType;
use crate::error::{Issue, Report};
use crate::parse::kind_name;
use crate::types::{ParameterDecl, ParameterSpec};
use crate::validators::pointer_token;
use serde_json::{Map, Value};

/// Checks processor parameter values against a [`ParameterSpec`].
#[derive(Clone, Debug, Default)]
pub struct ParameterValidator {
    spec: ParameterSpec,
}

impl ParameterValidator {
    pub fn new(spec: ParameterSpec) -> Self {
        ParameterValidator { spec }
    }

    pub fn spec(&self) -> &ParameterSpec {
        &self.spec
    }

    /// Check `values`:
    ///
    /// - undeclared keys are `"unknown-parameter"` warnings
    /// - present values must match their declaration
    /// - absent keys must be optional or have a default; the default itself
    ///   must match the declaration
    pub fn validate(&self, values: &Map<String, Value>) -> Report {
        let mut report = Report::new();

        for (name, value) in values {
            match self.spec.get(name) {
                None => report.push(
                    Issue::warning(
                        "unknown-parameter",
                        format!("parameter '{}' is not declared", name),
                    )
                    .at_pointer(format!("/{}", pointer_token(name))),
                ),
                Some(decl) => {
                    let pointer = format!("/{}", pointer_token(name));
                    for issue in check_value(name, decl, value, "value") {
                        report.push(issue.at_pointer(pointer.clone()));
                    }
                }
            }
        }

        for (name, decl) in self.spec.iter() {
            if values.contains_key(name) {
                continue;
            }
            match &decl.default {
                Some(default) => {
                    for issue in check_value(name, decl, default, "default") {
                        report.push(issue);
                    }
                }
                None if decl.required => report.push(Issue::error(
                    "missing-parameter",
                    format!("required parameter '{}' is missing and has no default", name),
                )),
                None => {}
            }
        }

        tracing::debug!(
            validator = "parameter",
            values = values.len(),
            issues = report.len(),
            "validated parameters"
        );
        report
    }

    /// [`validate`](Self::validate) for a value of unknown shape.
    pub fn validate_value(&self, values: &Value) -> Report {
        match values {
            Value::Object(map) => self.validate(map),
            other => Report::single(Issue::error(
                "type-mismatch",
                format!("parameters must be an object, found {}", kind_name(other)),
            )),
        }
    }

    /// Check only the declared defaults. Pointers are `/<name>/default`.
    pub fn check_defaults(&self) -> Report {
        let mut report = Report::new();
        for (name, decl) in self.spec.iter() {
            if let Some(default) = &decl.default {
                let pointer = format!("/{}/default", pointer_token(name));
                for issue in check_value(name, decl, default, "default") {
                    report.push(issue.at_pointer(pointer.clone()));
                }
            }
        }
        report
    }
}

/// Type, enum and range checks for one value. A type mismatch suppresses the
/// other checks.
fn check_value(name: &str, decl: &ParameterDecl, value: &Value, what: &str) -> Vec<Issue> {
    if !type_matches(decl.kind, value) {
        return vec![Issue::error(
            "type-mismatch",
            format!(
                "{} of parameter '{}' must be {}, found {}",
                what,
                name,
                decl.kind,
                kind_name(value)
            ),
        )];
    }

    let mut issues = Vec::new();
    if let Some(allowed) = &decl.allowed_values
        && !allowed.contains(value)
    {
        let listed: Vec<String> = allowed.iter().map(Value::to_string).collect();
        issues.push(Issue::error(
            "invalid-enum-value",
            format!(
                "{} of parameter '{}' must be one of [{}], found {}",
                what,
                name,
                listed.join(", "),
                value
            ),
        ));
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = decl.minimum
            && n < min
        {
            issues.push(Issue::error(
                "out-of-range",
                format!("{} of parameter '{}' is {}, below minimum {}", what, name, n, min),
            ));
        }
        if let Some(max) = decl.maximum
            && n > max
        {
            issues.push(Issue::error(
                "out-of-range",
                format!("{} of parameter '{}' is {}, above maximum {}", what, name, n, max),
            ));
        }
    }
    issues
}

fn type_matches(kind: ParameterType, value: &Value) -> bool {
    match kind {
        ParameterType::String => value.is_string(),
        ParameterType::Number => value.is_number(),
        ParameterType::Integer => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        ParameterType::Boolean => value.is_boolean(),
        ParameterType::Object => value.is_object(),
        ParameterType::Array => value.is_array(),
        // Membership is the only constraint; checked against `enum`.
        ParameterType::Enum => true,
    }
}
