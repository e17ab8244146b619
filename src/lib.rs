//! Validators for the artifacts of the [OCR-D](https://ocr-d.de) document
//! processing framework.
//!
//! Every validator reads one artifact and returns a [`Report`]: the complete,
//! ordered list of problems found in a single pass. Bad input never surfaces as
//! an `Err`; only a broken schema repository does ([`ValidatorError`]).
//!
//! ```text
//! METS  → WorkspaceValidator → XsdMetsValidator
//!                            → XsdPageValidator + PageValidator (per PAGE file)
//! OCRD-ZIP → OcrdZipValidator → WorkspaceValidator   (issues prefixed workspace:)
//! ocrd-tool.json → OcrdToolValidator → ParameterValidator::check_defaults
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use ocrd_validators::{ParameterDecl, ParameterSpec, ParameterValidator};
//! use ocrd_validators::enums::ParameterType;
//! use serde_json::json;
//!
//! let spec = ParameterSpec::new()
//!     .with("level", ParameterDecl::new(ParameterType::String)
//!         .with_allowed_values(vec![json!("page"), json!("region"), json!("line")]))
//!     .with("dpi", ParameterDecl::new(ParameterType::Integer).with_default(json!(300)));
//!
//! let values = json!({"level": "word"});
//! let report = ParameterValidator::new(spec).validate_value(&values);
//! assert!(!report.is_valid());
//! assert_eq!(report.issues()[0].category, "invalid-enum-value");
//! ```
//!
//! # Schemas
//!
//! The structural grammars are embedded from `schemas/` and loaded once per
//! process ([`SchemaRepository::builtin`]). Set `OCRD_VALIDATORS_SCHEMA_DIR`
//! and use [`SchemaRepository::from_env`] to override them.

pub mod bag;
pub mod defaults;
pub mod digest;
pub mod enums;
pub mod error;
pub mod model;
pub mod parse;
pub mod registry;
pub mod schema;
pub mod serialize;
pub mod types;
pub mod validators;
pub mod xml;

pub use error::*;
pub use types::*;
pub use validators::*;

pub use bag::Bag;
pub use defaults::apply_defaults;
pub use model::{PageDocument, Workspace, WorkspaceDescriptor};
pub use schema::SchemaRepository;
pub use xml::XmlDocument;

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The closed set of artifact kinds [`validate_artifact`] dispatches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    MetsXsd,
    PageXsd,
    PageSemantic,
    Parameter,
    ToolManifest,
    ResourceList,
    Workspace,
    ZipBag,
    ServerConfig,
    NetworkMessage,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 10] = [
        ArtifactKind::MetsXsd,
        ArtifactKind::PageXsd,
        ArtifactKind::PageSemantic,
        ArtifactKind::Parameter,
        ArtifactKind::ToolManifest,
        ArtifactKind::ResourceList,
        ArtifactKind::Workspace,
        ArtifactKind::ZipBag,
        ArtifactKind::ServerConfig,
        ArtifactKind::NetworkMessage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ArtifactKind::MetsXsd => "mets-xsd",
            ArtifactKind::PageXsd => "page-xsd",
            ArtifactKind::PageSemantic => "page-semantic",
            ArtifactKind::Parameter => "parameter",
            ArtifactKind::ToolManifest => "tool-manifest",
            ArtifactKind::ResourceList => "resource-list",
            ArtifactKind::Workspace => "workspace",
            ArtifactKind::ZipBag => "zip-bag",
            ArtifactKind::ServerConfig => "server-config",
            ArtifactKind::NetworkMessage => "network-message",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown artifact kind '{}'", s))
    }
}

/// An artifact together with whatever its validator needs besides the
/// built-in schemas.
#[derive(Clone, Copy, Debug)]
pub enum Artifact<'a> {
    MetsXsd(&'a XmlDocument),
    PageXsd(&'a XmlDocument),
    PageSemantic {
        page: &'a PageDocument,
        options: &'a PageValidationOptions,
    },
    Parameter {
        values: &'a Map<String, Value>,
        spec: &'a ParameterSpec,
    },
    ToolManifest(&'a Value),
    ResourceList(&'a Value),
    Workspace {
        workspace: &'a Workspace,
        options: &'a WorkspaceValidationOptions,
    },
    ZipBag {
        bag: &'a Bag,
        options: &'a ZipValidationOptions,
    },
    ServerConfig(&'a Value),
    NetworkMessage(&'a Value),
}

impl Artifact<'_> {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::MetsXsd(_) => ArtifactKind::MetsXsd,
            Artifact::PageXsd(_) => ArtifactKind::PageXsd,
            Artifact::PageSemantic { .. } => ArtifactKind::PageSemantic,
            Artifact::Parameter { .. } => ArtifactKind::Parameter,
            Artifact::ToolManifest(_) => ArtifactKind::ToolManifest,
            Artifact::ResourceList(_) => ArtifactKind::ResourceList,
            Artifact::Workspace { .. } => ArtifactKind::Workspace,
            Artifact::ZipBag { .. } => ArtifactKind::ZipBag,
            Artifact::ServerConfig(_) => ArtifactKind::ServerConfig,
            Artifact::NetworkMessage(_) => ArtifactKind::NetworkMessage,
        }
    }
}

/// Validate any artifact against the built-in schemas.
///
/// # Errors
///
/// Returns `Err` only when the built-in schema repository cannot be loaded.
/// Problems with the artifact itself are issues in the returned [`Report`].
pub fn validate_artifact(artifact: Artifact<'_>) -> Result<Report, ValidatorError> {
    let repo = SchemaRepository::builtin()?;
    let report = match artifact {
        Artifact::MetsXsd(doc) => XsdMetsValidator::new(&repo)?.validate(doc),
        Artifact::PageXsd(doc) => XsdPageValidator::new(&repo)?.validate(doc),
        Artifact::PageSemantic { page, options } => {
            PageValidator::new(options.clone()).validate(page)
        }
        Artifact::Parameter { values, spec } => {
            ParameterValidator::new(spec.clone()).validate(values)
        }
        Artifact::ToolManifest(manifest) => OcrdToolValidator::new(&repo)?.validate(manifest),
        Artifact::ResourceList(list) => OcrdResourceListValidator::new(&repo)?.validate_value(list),
        Artifact::Workspace { workspace, options } => {
            WorkspaceValidator::new(&repo)?.validate(workspace, options)
        }
        Artifact::ZipBag { bag, options } => OcrdZipValidator::new(&repo)?.validate(bag, options),
        Artifact::ServerConfig(config) => {
            ProcessingServerConfigValidator::new(&repo)?.validate(config)
        }
        Artifact::NetworkMessage(message) => {
            OcrdNetworkMessageValidator::new(&repo)?.validate(message)
        }
    };
    tracing::debug!(
        artifact = %artifact.kind(),
        valid = report.is_valid(),
        issues = report.len(),
        "dispatched artifact"
    );
    Ok(report)
}
