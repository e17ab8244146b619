use crate::error::{Issue, Report, ValidatorError};
use crate::parse::parse_mapping;
use crate::schema::{self, JsonSchema, SchemaRepository};
use crate::types::ServerConfig;
use crate::validators::{schema_category, schema_report};
use regex::Regex;
use serde_json::Value;
use std::net::IpAddr;
use std::sync::{Arc, LazyLock};
use url::Url;

// RFC 1123 host name; the 253-character limit is checked separately.
static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .unwrap()
});

/// Checks the processing-server configuration.
#[derive(Clone, Debug)]
pub struct ProcessingServerConfigValidator {
    schema: Arc<JsonSchema>,
}

impl ProcessingServerConfigValidator {
    pub fn new(repo: &SchemaRepository) -> Result<Self, ValidatorError> {
        Ok(ProcessingServerConfigValidator {
            schema: repo.json_schema(schema::PROCESSING_SERVER_CONFIG)?,
        })
    }

    pub fn builtin() -> Result<Self, ValidatorError> {
        let repo = SchemaRepository::builtin()?;
        Self::new(&repo)
    }

    pub fn validate(&self, config: &Value) -> Report {
        let mut report = schema_report(&self.schema, config);

        // A configuration that does not even deserialize has schema errors
        // already; the cross-field checks need the typed form.
        match serde_json::from_value::<ServerConfig>(config.clone()) {
            Ok(typed) => {
                check_endpoints(&typed, &mut report);
                check_queue_references(&typed, &mut report);
            }
            Err(e) if report.is_valid() => {
                report.push(Issue::error(schema_category(&self.schema), e.to_string()));
            }
            Err(_) => {}
        }

        tracing::debug!(
            validator = "processing-server-config",
            errors = report.errors().count(),
            "validated processing server configuration"
        );
        report
    }

    /// Parse YAML or JSON text, then [`validate`](Self::validate).
    pub fn validate_str(&self, input: &str) -> Report {
        match parse_mapping(input) {
            Ok(config) => self.validate(&config),
            Err(e) => Report::single(e.into_issue()),
        }
    }
}

fn check_endpoints(config: &ServerConfig, report: &mut Report) {
    let endpoints = [
        ("process_queue", &config.process_queue.address, config.process_queue.port),
        ("database", &config.database.address, config.database.port),
    ];
    for (section, address, port) in endpoints {
        check_address(address, &format!("/{}/address", section), report);
        if !(1..=65535).contains(&port) {
            report.push(
                Issue::error(
                    "invalid-port",
                    format!("{} port {} is outside 1-65535", section, port),
                )
                .at_pointer(format!("/{}/port", section)),
            );
        }
    }

    for (i, host) in config.hosts.iter().enumerate() {
        check_address(&host.address, &format!("/hosts/{}/address", i), report);
    }

    if let Some(url) = &config.internal_callback_url
        && let Err(e) = Url::parse(url)
    {
        report.push(
            Issue::error(
                "invalid-url",
                format!("internal_callback_url '{}' is malformed: {}", url, e),
            )
            .at_pointer("/internal_callback_url"),
        );
    }
}

fn check_address(address: &str, pointer: &str, report: &mut Report) {
    if !is_valid_address(address) {
        report.push(
            Issue::error(
                "invalid-address",
                format!("'{}' is neither an IP address nor a valid host name", address),
            )
            .at_pointer(pointer),
        );
    }
}

pub(crate) fn is_valid_address(address: &str) -> bool {
    if address.parse::<IpAddr>().is_ok() {
        return true;
    }
    address.len() <= 253 && HOSTNAME_RE.is_match(address)
}

fn check_queue_references(config: &ServerConfig, report: &mut Report) {
    let queues = &config.process_queue.queues;
    for (i, host) in config.hosts.iter().enumerate() {
        for (j, worker) in host.workers.iter().enumerate() {
            let queue = worker.queue_name();
            if !queues.iter().any(|q| q == queue) {
                let field = if worker.queue.is_some() { "queue" } else { "name" };
                report.push(
                    Issue::error(
                        "undefined-queue-reference",
                        format!(
                            "worker '{}' on host '{}' consumes queue '{}', which process_queue.queues does not declare",
                            worker.name, host.address, queue
                        ),
                    )
                    .at_pointer(format!("/hosts/{}/workers/{}/{}", i, j, field)),
                );
            }
        }
    }
}
