use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::enums::*;

// ─── Parameters ─────────────────────────────────────────────────────────────

/// Declaration of a single processor parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterDecl {
    #[serde(rename = "type")]
    pub kind: ParameterType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParameterDecl {
    pub fn new(kind: ParameterType) -> Self {
        ParameterDecl {
            kind,
            required: false,
            default: None,
            allowed_values: None,
            minimum: None,
            maximum: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_allowed_values(mut self, values: Vec<Value>) -> Self {
        self.allowed_values = Some(values);
        self
    }

    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }
}

/// Parameter name → declaration, in declaration order.
///
/// Usually deserialized from the `parameters` block of a tool manifest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterSpec {
    entries: Vec<(String, ParameterDecl)>,
}

impl ParameterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A repeated name replaces the earlier declaration.
    pub fn with(mut self, name: impl Into<String>, decl: ParameterDecl) -> Self {
        self.insert(name, decl);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, decl: ParameterDecl) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = decl,
            None => self.entries.push((name, decl)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParameterDecl> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, decl)| decl)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterDecl)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build from a manifest `parameters` value.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }
}

impl Serialize for ParameterSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, decl) in &self.entries {
            map.serialize_entry(name, decl)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParameterSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Map keeps insertion order (preserve_order), so declaration order survives.
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut spec = ParameterSpec::new();
        for (name, value) in raw {
            let decl: ParameterDecl = serde_json::from_value(value)
                .map_err(|e| D::Error::custom(format!("parameter '{}': {}", name, e)))?;
            spec.insert(name, decl);
        }
        Ok(spec)
    }
}

// ─── Resources ──────────────────────────────────────────────────────────────

/// One entry of a resource list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ResourceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_in_archive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_usage: Option<ParameterUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_range: Option<String>,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        ResourceDescriptor {
            name: name.into(),
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

// ─── Processing server configuration ────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub process_queue: QueueConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_callback_url: Option<String>,
}

/// Message queue the processing server publishes jobs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub address: String,
    pub port: i64,
    #[serde(default)]
    pub queues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshConfig>,
    #[serde(default)]
    pub skip_deployment: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub address: String,
    pub port: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshConfig>,
    #[serde(default)]
    pub skip_deployment: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SshConfig {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_to_privkey: Option<String>,
}

/// A machine processing workers are deployed on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_to_privkey: Option<String>,
    #[serde(default)]
    pub workers: Vec<WorkerConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Processor executable, e.g. `ocrd-cis-ocropy-binarize`.
    pub name: String,
    /// Queue the worker consumes; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(default = "default_instances")]
    pub number_of_instance: u32,
    #[serde(default)]
    pub deploy_type: DeployType,
}

fn default_instances() -> u32 {
    1
}

impl WorkerConfig {
    pub fn queue_name(&self) -> &str {
        self.queue.as_deref().unwrap_or(&self.name)
    }
}

// ─── Validator options ──────────────────────────────────────────────────────

/// Options for [`crate::validators::PageValidator`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageValidationOptions {
    pub strictness: TextStrictness,
    pub check_coordinate_consistency: bool,
}

impl Default for PageValidationOptions {
    fn default() -> Self {
        PageValidationOptions {
            strictness: TextStrictness::Strict,
            check_coordinate_consistency: true,
        }
    }
}

/// Options for [`crate::validators::WorkspaceValidator`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceValidationOptions {
    pub skip_page_checks: bool,
    pub skip_image_checks: bool,
    pub check_file_existence: bool,
    pub page: PageValidationOptions,
}

impl Default for WorkspaceValidationOptions {
    fn default() -> Self {
        WorkspaceValidationOptions {
            skip_page_checks: false,
            skip_image_checks: false,
            check_file_existence: true,
            page: PageValidationOptions::default(),
        }
    }
}

/// Options for [`crate::validators::OcrdZipValidator`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZipValidationOptions {
    pub skip_checksums: bool,
    pub skip_bag: bool,
    pub workspace: WorkspaceValidationOptions,
}
