use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Issue severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Error taxonomy an issue falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueClass {
    /// Schema non-conformance or unparseable input.
    Structural,
    /// Domain-rule violation: dangling reference, duplicate identifier, degenerate geometry.
    Semantic,
    /// Non-fatal advisory.
    Advisory,
}

/// Where in an artifact an issue was found.
///
/// XML sources carry `line`/`column`; JSON and YAML artifacts carry a JSON
/// Pointer. `file` names the sub-artifact (e.g. a METS file ID) when the issue
/// was produced by a child validator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
}

impl Location {
    pub fn at(line: usize, column: usize) -> Self {
        Location {
            line: Some(line),
            column: Some(column),
            ..Default::default()
        }
    }

    pub fn pointer(pointer: impl Into<String>) -> Self {
        Location {
            pointer: Some(pointer.into()),
            ..Default::default()
        }
    }

    pub fn file(file: impl Into<String>) -> Self {
        Location {
            file: Some(file.into()),
            ..Default::default()
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(file) = &self.file {
            parts.push(file.clone());
        }
        match (self.line, self.column) {
            (Some(line), Some(col)) => parts.push(format!("{}:{}", line, col)),
            (Some(line), None) => parts.push(line.to_string()),
            _ => {}
        }
        if let Some(pointer) = &self.pointer {
            parts.push(pointer.clone());
        }
        write!(f, "{}", parts.join(":"))
    }
}

/// A single finding produced by a validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub message: String,
}

impl Issue {
    pub fn error(category: impl Into<String>, message: impl Into<String>) -> Self {
        Issue {
            severity: Severity::Error,
            category: category.into(),
            location: None,
            message: message.into(),
        }
    }

    pub fn warning(category: impl Into<String>, message: impl Into<String>) -> Self {
        Issue {
            severity: Severity::Warning,
            category: category.into(),
            location: None,
            message: message.into(),
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn at(self, line: usize, column: usize) -> Self {
        self.with_location(Location::at(line, column))
    }

    pub fn at_pointer(self, pointer: impl Into<String>) -> Self {
        self.with_location(Location::pointer(pointer))
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Classify the issue. Categories carrying an `xsd` or `parse-error`
    /// segment (also behind a `workspace:` prefix) are structural.
    pub fn class(&self) -> IssueClass {
        if self.severity == Severity::Warning {
            return IssueClass::Advisory;
        }
        let structural = self
            .category
            .split(':')
            .any(|seg| matches!(seg, "xsd" | "parse-error"));
        if structural {
            IssueClass::Structural
        } else {
            IssueClass::Semantic
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(
                f,
                "[{}] {} at {}: {}",
                self.severity, self.category, loc, self.message
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.category, self.message),
        }
    }
}

/// Result of a validator call: an ordered sequence of issues.
///
/// Validators build a fresh report per call. Once returned it can only be read
/// or combined into a new report; issue order is preserved by every combinator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ReportRepr", from = "ReportRepr")]
pub struct Report {
    issues: Vec<Issue>,
}

/// Stable wire shape of a [`Report`]: `{valid, issues}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ReportRepr {
    valid: bool,
    #[serde(default)]
    issues: Vec<Issue>,
}

impl From<Report> for ReportRepr {
    fn from(report: Report) -> Self {
        ReportRepr {
            valid: report.is_valid(),
            issues: report.issues,
        }
    }
}

impl From<ReportRepr> for Report {
    fn from(repr: ReportRepr) -> Self {
        Report {
            issues: repr.issues,
        }
    }
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Report { issues }
    }

    /// A report holding a single issue.
    pub fn single(issue: Issue) -> Self {
        Report {
            issues: vec![issue],
        }
    }

    pub(crate) fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub(crate) fn extend(&mut self, other: Report) {
        self.issues.extend(other.issues);
    }

    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(Issue::is_error)
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues whose category equals `category`.
    pub fn with_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Issue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// Concatenate `other` after `self`.
    pub fn merge(mut self, other: Report) -> Report {
        self.issues.extend(other.issues);
        self
    }

    /// Prefix every category with `prefix:`.
    pub fn with_category_prefix(self, prefix: &str) -> Report {
        Report {
            issues: self
                .issues
                .into_iter()
                .map(|mut issue| {
                    issue.category = format!("{}:{}", prefix, issue.category);
                    issue
                })
                .collect(),
        }
    }

    /// Re-root JSON Pointers under `prefix`. Issues without a pointer get
    /// `prefix` itself.
    pub fn with_pointer_prefix(self, prefix: &str) -> Report {
        Report {
            issues: self
                .issues
                .into_iter()
                .map(|mut issue| {
                    let loc = issue.location.get_or_insert_with(Location::default);
                    loc.pointer = Some(match loc.pointer.take() {
                        Some(p) => format!("{}{}", prefix, p),
                        None => prefix.to_string(),
                    });
                    issue
                })
                .collect(),
        }
    }

    /// Tag every issue with the sub-artifact it came from. An existing file tag
    /// is kept.
    pub fn with_file(self, file: &str) -> Report {
        Report {
            issues: self
                .issues
                .into_iter()
                .map(|mut issue| {
                    let loc = issue.location.get_or_insert_with(Location::default);
                    if loc.file.is_none() {
                        loc.file = Some(file.to_string());
                    }
                    issue
                })
                .collect(),
        }
    }
}

impl FromIterator<Issue> for Report {
    fn from_iter<T: IntoIterator<Item = Issue>>(iter: T) -> Self {
        Report {
            issues: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors().count();
        let warnings = self.warnings().count();
        writeln!(
            f,
            "{} ({} error(s), {} warning(s))",
            if self.is_valid() { "valid" } else { "invalid" },
            errors,
            warnings
        )?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

/// Error kind for parse failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    Syntax,
    TypeMismatch,
    Io,
}

/// Produced when an input artifact cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl ParseError {
    pub fn syntax(message: impl Into<String>) -> Self {
        ParseError {
            kind: ParseErrorKind::Syntax,
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// The single terminal issue a validator reports for unparseable input.
    pub fn into_issue(self) -> Issue {
        let issue = Issue::error("parse-error", self.message);
        match (self.line, self.column) {
            (Some(line), Some(col)) => issue.at(line, col),
            _ => issue,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, "{}:{}: {}", line, col, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ParseError {}

/// Produced when a report cannot be rendered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializeError {
    pub message: String,
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SerializeError {}

/// Hard failures that prevent producing any meaningful report.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidatorError {
    /// A schema file could not be read or parsed.
    #[error("failed to load schema {name}: {reason}")]
    SchemaLoad { name: String, reason: String },

    /// A schema was read but could not be compiled into a validator.
    #[error("failed to compile schema {name}: {reason}")]
    SchemaCompile { name: String, reason: String },

    /// The requested schema is not part of the repository.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),
}
