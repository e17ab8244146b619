//! Structural grammars and the process-wide schema repository.
//!
//! Two kinds of schema are supported:
//!
//! - [`XmlSchema`]: a declarative XML grammar (root element, element
//!   declarations with child particles, typed attributes, `ID`/`IDREF`), read
//!   from a `<name>.xsd.json` document.
//! - [`JsonSchema`]: a compiled JSON Schema for JSON/YAML artifacts, read from
//!   a `<name>.schema.json` document.
//!
//! Schemas are immutable after load and are shared through `Arc`; every type
//! here is `Send + Sync`.

use crate::error::ValidatorError;
use crate::xml::{XML_NS, XSI_NS, XmlDocument, XmlElement};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};

// ─── Schema names ───────────────────────────────────────────────────────────

pub const METS: &str = "mets";
pub const PAGE: &str = "page";
pub const OCRD_TOOL: &str = "ocrd-tool";
pub const RESOURCE_LIST: &str = "resource-list";
pub const PROCESSING_SERVER_CONFIG: &str = "processing-server-config";
pub const MESSAGE_PROCESSING: &str = "message-processing";
pub const MESSAGE_RESULT: &str = "message-result";

/// Environment variable naming a directory whose schema files override the
/// built-in ones.
pub const SCHEMA_DIR_ENV: &str = "OCRD_VALIDATORS_SCHEMA_DIR";

static BUILTIN_XML: &[(&str, &str)] = &[
    (METS, include_str!("../schemas/mets.xsd.json")),
    (PAGE, include_str!("../schemas/page.xsd.json")),
];

static BUILTIN_JSON: &[(&str, &str)] = &[
    (OCRD_TOOL, include_str!("../schemas/ocrd-tool.schema.json")),
    (RESOURCE_LIST, include_str!("../schemas/resource-list.schema.json")),
    (
        PROCESSING_SERVER_CONFIG,
        include_str!("../schemas/processing-server-config.schema.json"),
    ),
    (
        MESSAGE_PROCESSING,
        include_str!("../schemas/message-processing.schema.json"),
    ),
    (
        MESSAGE_RESULT,
        include_str!("../schemas/message-result.schema.json"),
    ),
];

static BUILTIN: LazyLock<Result<Arc<SchemaRepository>, ValidatorError>> = LazyLock::new(|| {
    let xml = BUILTIN_XML
        .iter()
        .map(|(name, src)| (name.to_string(), src.to_string()))
        .collect();
    let json = BUILTIN_JSON
        .iter()
        .map(|(name, src)| (name.to_string(), src.to_string()))
        .collect();
    SchemaRepository::from_sources(xml, json).map(Arc::new)
});

// ─── Cached regexes ─────────────────────────────────────────────────────────

static POINTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+,[0-9]+ )+([0-9]+,[0-9]+)$").unwrap());

static NCNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap());

static DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9]{4,}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?(Z|[+-][0-9]{2}:[0-9]{2})?$")
        .unwrap()
});

// ─── XML grammar ────────────────────────────────────────────────────────────

/// Declarative XML grammar.
#[derive(Clone, Debug, Deserialize)]
pub struct XmlSchema {
    pub name: String,
    /// Target namespace of all declared elements.
    pub namespace: String,
    /// Older namespace URIs accepted as equivalent to `namespace`.
    #[serde(default)]
    pub alternative_namespaces: Vec<String>,
    /// Prefixes usable in attribute declarations, e.g. `xlink`.
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
    pub root: String,
    pub elements: BTreeMap<String, ElementDecl>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ElementDecl {
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeDecl>,
    #[serde(default)]
    pub children: Vec<Particle>,
    /// Children must appear in particle order.
    #[serde(default)]
    pub ordered: bool,
    /// Undeclared attributes are accepted.
    #[serde(default)]
    pub open_attributes: bool,
    /// Undeclared and foreign child elements are accepted and not descended into.
    #[serde(default)]
    pub open_content: bool,
    /// Character data is allowed.
    #[serde(default = "default_true")]
    pub mixed: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AttributeDecl {
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default)]
    pub kind: AttributeType,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    #[default]
    String,
    Integer,
    Decimal,
    Boolean,
    Points,
    Id,
    Idref,
    DateTime,
    Enumeration,
}

/// One child slot of an element declaration.
#[derive(Clone, Debug, Deserialize)]
pub struct Particle {
    pub element: String,
    #[serde(default)]
    pub min: u32,
    /// `null` means unbounded.
    #[serde(default = "default_max")]
    pub max: Option<u32>,
}

fn default_true() -> bool {
    true
}

fn default_max() -> Option<u32> {
    Some(1)
}

/// A single grammar violation with the position of the offending element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrammarViolation {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl XmlSchema {
    /// Parse and sanity-check a grammar document.
    pub fn from_json(name: &str, source: &str) -> Result<Self, ValidatorError> {
        let schema: XmlSchema =
            serde_json::from_str(source).map_err(|e| ValidatorError::SchemaLoad {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        schema.check_consistency()?;
        Ok(schema)
    }

    fn check_consistency(&self) -> Result<(), ValidatorError> {
        let compile_error = |reason: String| ValidatorError::SchemaCompile {
            name: self.name.clone(),
            reason,
        };
        if !self.elements.contains_key(&self.root) {
            return Err(compile_error(format!(
                "root element '{}' is not declared",
                self.root
            )));
        }
        for (el_name, decl) in &self.elements {
            for (attr_name, attr) in &decl.attributes {
                if attr.kind == AttributeType::Enumeration && attr.values.is_empty() {
                    return Err(compile_error(format!(
                        "enumeration attribute '{}' on '{}' declares no values",
                        attr_name, el_name
                    )));
                }
                if let Some((prefix, _)) = attr_name.split_once(':')
                    && prefix != "xml"
                    && !self.prefixes.contains_key(prefix)
                {
                    return Err(compile_error(format!(
                        "attribute '{}' on '{}' uses undeclared prefix '{}'",
                        attr_name, el_name, prefix
                    )));
                }
            }
            for particle in &decl.children {
                if let Some(max) = particle.max
                    && max < particle.min
                {
                    return Err(compile_error(format!(
                        "particle '{}' in '{}' has max < min",
                        particle.element, el_name
                    )));
                }
            }
        }
        Ok(())
    }

    fn in_namespace(&self, el: &XmlElement) -> bool {
        match el.namespace.as_deref() {
            Some(ns) => ns == self.namespace || self.alternative_namespaces.iter().any(|a| a == ns),
            None => false,
        }
    }

    fn resolve_attr_key<'a>(&'a self, key: &'a str) -> (Option<&'a str>, &'a str) {
        match key.split_once(':') {
            Some(("xml", local)) => (Some(XML_NS), local),
            Some((prefix, local)) => (self.prefixes.get(prefix).map(String::as_str), local),
            None => (None, key),
        }
    }

    /// Check a document against this grammar. Returns every violation found,
    /// in document order, with ID/IDREF problems last.
    pub fn validate(&self, doc: &XmlDocument) -> Vec<GrammarViolation> {
        let mut state = WalkState::default();
        let root = &doc.root;
        if !self.in_namespace(root) || root.local_name != self.root {
            state.violation(
                root,
                format!(
                    "root element '{}' is not '{}' in namespace '{}'",
                    root.name, self.root, self.namespace
                ),
            );
            return state.violations;
        }
        self.walk(root, &mut state);

        for (value, attr, line, column) in std::mem::take(&mut state.idrefs) {
            if !state.ids.contains_key(&value) {
                state.violations.push(GrammarViolation {
                    message: format!(
                        "IDREF '{}' in attribute '{}' does not match any ID",
                        value, attr
                    ),
                    line,
                    column,
                });
            }
        }
        state.violations
    }

    fn walk(&self, el: &XmlElement, state: &mut WalkState) {
        let Some(decl) = self.elements.get(&el.local_name) else {
            return;
        };

        self.check_attributes(el, decl, state);

        let mut counts = vec![0u32; decl.children.len()];
        let mut furthest = 0usize;
        for child in &el.children {
            if !self.in_namespace(child) {
                if !decl.open_content {
                    state.violation(
                        child,
                        format!("element '{}' is not allowed in '{}'", child.name, el.name),
                    );
                }
                continue;
            }
            let Some(idx) = decl
                .children
                .iter()
                .position(|p| p.element == child.local_name)
            else {
                if !decl.open_content {
                    state.violation(
                        child,
                        format!("element '{}' is not allowed in '{}'", child.name, el.name),
                    );
                }
                continue;
            };
            counts[idx] += 1;
            if decl.ordered && idx < furthest {
                state.violation(
                    child,
                    format!("element '{}' is out of order in '{}'", child.name, el.name),
                );
            }
            furthest = furthest.max(idx);
            self.walk(child, state);
        }

        for (particle, count) in decl.children.iter().zip(counts) {
            if count < particle.min {
                state.violation(
                    el,
                    format!(
                        "element '{}' requires at least {} '{}' child element(s), found {}",
                        el.name, particle.min, particle.element, count
                    ),
                );
            }
            if let Some(max) = particle.max
                && count > max
            {
                state.violation(
                    el,
                    format!(
                        "element '{}' allows at most {} '{}' child element(s), found {}",
                        el.name, max, particle.element, count
                    ),
                );
            }
        }

        if !decl.mixed && !el.text.trim().is_empty() {
            state.violation(
                el,
                format!("element '{}' must not contain character data", el.name),
            );
        }
    }

    fn check_attributes(&self, el: &XmlElement, decl: &ElementDecl, state: &mut WalkState) {
        for (key, attr_decl) in &decl.attributes {
            let (ns, local) = self.resolve_attr_key(key);
            let found = el
                .attributes
                .iter()
                .find(|a| a.namespace.as_deref() == ns && a.local_name == local);
            match found {
                None if attr_decl.required => state.violation(
                    el,
                    format!(
                        "missing required attribute '{}' on element '{}'",
                        key, el.name
                    ),
                ),
                None => {}
                Some(attr) => {
                    if let Some(problem) = check_attribute_value(attr_decl, &attr.value) {
                        state.violation(
                            el,
                            format!(
                                "attribute '{}' on element '{}': {}",
                                key, el.name, problem
                            ),
                        );
                        continue;
                    }
                    match attr_decl.kind {
                        AttributeType::Id => {
                            if let Some(&(line, col)) = state.ids.get(&attr.value) {
                                state.violation(
                                    el,
                                    format!(
                                        "duplicate ID value '{}' (first declared at {}:{})",
                                        attr.value, line, col
                                    ),
                                );
                            } else {
                                state
                                    .ids
                                    .insert(attr.value.clone(), (el.line, el.column));
                            }
                        }
                        AttributeType::Idref => state.idrefs.push((
                            attr.value.clone(),
                            key.clone(),
                            el.line,
                            el.column,
                        )),
                        _ => {}
                    }
                }
            }
        }

        if decl.open_attributes {
            return;
        }
        for attr in &el.attributes {
            if matches!(attr.namespace.as_deref(), Some(XSI_NS) | Some(XML_NS)) {
                continue;
            }
            let declared = decl.attributes.keys().any(|key| {
                let (ns, local) = self.resolve_attr_key(key);
                attr.namespace.as_deref() == ns && attr.local_name == local
            });
            if !declared {
                state.violation(
                    el,
                    format!(
                        "attribute '{}' is not allowed on element '{}'",
                        attr.name, el.name
                    ),
                );
            }
        }
    }
}

#[derive(Default)]
struct WalkState {
    violations: Vec<GrammarViolation>,
    ids: HashMap<String, (usize, usize)>,
    idrefs: Vec<(String, String, usize, usize)>,
}

impl WalkState {
    fn violation(&mut self, el: &XmlElement, message: String) {
        self.violations.push(GrammarViolation {
            message,
            line: el.line,
            column: el.column,
        });
    }
}

fn check_attribute_value(decl: &AttributeDecl, value: &str) -> Option<String> {
    let ok = match decl.kind {
        AttributeType::String => true,
        AttributeType::Integer => value.trim().parse::<i64>().is_ok(),
        AttributeType::Decimal => value.trim().parse::<f64>().is_ok_and(f64::is_finite),
        AttributeType::Boolean => matches!(value.trim(), "true" | "false" | "1" | "0"),
        AttributeType::Points => POINTS_RE.is_match(value),
        AttributeType::Id | AttributeType::Idref => NCNAME_RE.is_match(value),
        AttributeType::DateTime => DATETIME_RE.is_match(value.trim()),
        AttributeType::Enumeration => decl.values.iter().any(|v| v == value),
    };
    if ok {
        return None;
    }
    Some(match decl.kind {
        AttributeType::Enumeration => format!(
            "value '{}' is not one of [{}]",
            value,
            decl.values.join(", ")
        ),
        kind => format!("value '{}' is not a valid {:?}", value, kind),
    })
}

// ─── JSON Schema ────────────────────────────────────────────────────────────

/// A compiled JSON Schema.
pub struct JsonSchema {
    name: String,
    validator: jsonschema::Validator,
}

/// A JSON Schema violation with the JSON Pointer of the offending value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaViolation {
    pub pointer: String,
    pub message: String,
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema").field("name", &self.name).finish()
    }
}

impl JsonSchema {
    pub fn compile(name: &str, schema: &Value) -> Result<Self, ValidatorError> {
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft7)
            .build(schema)
            .map_err(|e| ValidatorError::SchemaCompile {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(JsonSchema {
            name: name.to_string(),
            validator,
        })
    }

    pub fn from_json(name: &str, source: &str) -> Result<Self, ValidatorError> {
        let schema: Value =
            serde_json::from_str(source).map_err(|e| ValidatorError::SchemaLoad {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Self::compile(name, &schema)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn validate(&self, instance: &Value) -> Vec<SchemaViolation> {
        self.validator
            .iter_errors(instance)
            .map(|err| SchemaViolation {
                pointer: err.instance_path.to_string(),
                message: err.to_string(),
            })
            .collect()
    }
}

// ─── Repository ─────────────────────────────────────────────────────────────

/// All schemas known to the framework, keyed by stable name.
#[derive(Debug)]
pub struct SchemaRepository {
    xml: HashMap<String, Arc<XmlSchema>>,
    json: HashMap<String, Arc<JsonSchema>>,
}

impl SchemaRepository {
    /// The built-in schemas, loaded once per process.
    pub fn builtin() -> Result<Arc<SchemaRepository>, ValidatorError> {
        (*BUILTIN).clone()
    }

    /// Load from the directory named by [`SCHEMA_DIR_ENV`] if set, otherwise
    /// return the built-ins.
    pub fn from_env() -> Result<Arc<SchemaRepository>, ValidatorError> {
        match std::env::var_os(SCHEMA_DIR_ENV) {
            Some(dir) => Self::from_dir(dir).map(Arc::new),
            None => Self::builtin(),
        }
    }

    /// Load schemas from a directory. `<name>.xsd.json` and `<name>.schema.json`
    /// files override the built-in schema of the same name; names without a
    /// file keep the built-in.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<SchemaRepository, ValidatorError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ValidatorError::SchemaLoad {
                name: dir.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }
        let read = |name: &str, file: String, builtin: &str| -> Result<String, ValidatorError> {
            let path = dir.join(file);
            if path.is_file() {
                std::fs::read_to_string(&path).map_err(|e| ValidatorError::SchemaLoad {
                    name: name.to_string(),
                    reason: format!("{}: {}", path.display(), e),
                })
            } else {
                Ok(builtin.to_string())
            }
        };

        let mut xml = Vec::new();
        for (name, builtin) in BUILTIN_XML {
            xml.push((name.to_string(), read(name, format!("{}.xsd.json", name), builtin)?));
        }
        let mut json = Vec::new();
        for (name, builtin) in BUILTIN_JSON {
            json.push((
                name.to_string(),
                read(name, format!("{}.schema.json", name), builtin)?,
            ));
        }
        tracing::debug!(dir = %dir.display(), "loaded schema repository");
        Self::from_sources(xml, json)
    }

    /// Build a repository from `(name, source)` pairs.
    pub fn from_sources(
        xml: Vec<(String, String)>,
        json: Vec<(String, String)>,
    ) -> Result<SchemaRepository, ValidatorError> {
        let mut repo = SchemaRepository {
            xml: HashMap::new(),
            json: HashMap::new(),
        };
        for (name, source) in xml {
            let schema = XmlSchema::from_json(&name, &source)?;
            repo.xml.insert(name, Arc::new(schema));
        }
        for (name, source) in json {
            let schema = JsonSchema::from_json(&name, &source)?;
            repo.json.insert(name, Arc::new(schema));
        }
        Ok(repo)
    }

    pub fn xml_schema(&self, name: &str) -> Result<Arc<XmlSchema>, ValidatorError> {
        self.xml
            .get(name)
            .cloned()
            .ok_or_else(|| ValidatorError::SchemaNotFound(name.to_string()))
    }

    pub fn json_schema(&self, name: &str) -> Result<Arc<JsonSchema>, ValidatorError> {
        self.json
            .get(name)
            .cloned()
            .ok_or_else(|| ValidatorError::SchemaNotFound(name.to_string()))
    }

    /// Names of all loaded schemas, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .xml
            .keys()
            .chain(self.json.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }
}
