//! The validators. Each one is a pure function of its input and the shared
//! schemas: it returns a fresh [`Report`] and never fails on bad input.
//!
//! Composite validators own their children and merge the child reports:
//!
//! ```text
//! OcrdZipValidator
//!   └─ WorkspaceValidator           (issues prefixed `workspace:`)
//!        ├─ XsdMetsValidator
//!        ├─ XsdPageValidator         (issues tagged with the METS file id)
//!        └─ PageValidator
//! OcrdToolValidator ─ ParameterValidator::check_defaults
//! OcrdNetworkMessageValidator ─ ParameterValidator (optional)
//! ```

mod network_message;
mod ocrd_tool;
mod ocrd_zip;
mod page;
mod parameter;
mod resource_list;
mod server_config;
mod workspace;
mod xsd;

pub use network_message::OcrdNetworkMessageValidator;
pub use ocrd_tool::OcrdToolValidator;
pub use ocrd_zip::OcrdZipValidator;
pub use page::PageValidator;
pub use parameter::ParameterValidator;
pub use resource_list::OcrdResourceListValidator;
pub use server_config::ProcessingServerConfigValidator;
pub use workspace::WorkspaceValidator;
pub use xsd::{XsdMetsValidator, XsdPageValidator, XsdValidator};

use crate::error::{Issue, Report};
use crate::schema::JsonSchema;
use serde_json::Value;

/// Category of structural issues raised by a JSON Schema, e.g. `xsd:ocrd-tool`.
pub(crate) fn schema_category(schema: &JsonSchema) -> String {
    format!("xsd:{}", schema.name())
}

/// Run a JSON Schema and turn every violation into an `xsd:<schema>` error.
pub(crate) fn schema_report(schema: &JsonSchema, instance: &Value) -> Report {
    let category = schema_category(schema);
    schema
        .validate(instance)
        .into_iter()
        .map(|v| Issue::error(category.clone(), v.message).at_pointer(v.pointer))
        .collect()
}

/// Escape one JSON Pointer reference token (RFC 6901).
pub(crate) fn pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// `Issue::at` for optional positions.
pub(crate) fn positioned(issue: Issue, position: Option<(usize, usize)>) -> Issue {
    match position {
        Some((line, column)) => issue.at(line, column),
        None => issue,
    }
}
