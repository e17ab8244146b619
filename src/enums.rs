//! Closed enumerations used by the artifact types.
//!
//! Only the listed variants deserialize; anything else is rejected by the
//! artifact's schema before these types are built.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a processor parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    String,
    Number,
    #[serde(alias = "int")]
    Integer,
    Boolean,
    Object,
    Array,
    Enum,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterType::String => "string",
            ParameterType::Number => "number",
            ParameterType::Integer => "integer",
            ParameterType::Boolean => "boolean",
            ParameterType::Object => "object",
            ParameterType::Array => "array",
            ParameterType::Enum => "enum",
        };
        write!(f, "{}", s)
    }
}

/// How a resource is packaged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    #[default]
    File,
    Directory,
    Archive,
}

/// How a processor refers to a resource in its parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterUsage {
    #[default]
    AsIs,
    WithoutExtension,
}

/// How a processing worker is deployed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployType {
    #[default]
    Native,
    Docker,
}

/// Discriminator of a queue message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    JobSubmission,
    JobResult,
}

impl MessageKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "job-submission" => Some(MessageKind::JobSubmission),
            "job-result" => Some(MessageKind::JobResult),
            _ => None,
        }
    }
}

/// How strictly text equivalences of nested PAGE elements must agree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStrictness {
    /// Exact match; a difference is an error.
    #[default]
    Strict,
    /// Whitespace-normalized match; a difference is a warning.
    Lax,
    Off,
}

/// Checksum algorithms understood for resources and bag manifests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Some(DigestAlgorithm::Sha256),
            "sha512" | "sha-512" => Some(DigestAlgorithm::Sha512),
            _ => None,
        }
    }

    /// Length of the hex-encoded digest.
    pub fn hex_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 64,
            DigestAlgorithm::Sha512 => 128,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestAlgorithm::Sha256 => write!(f, "sha256"),
            DigestAlgorithm::Sha512 => write!(f, "sha512"),
        }
    }
}
