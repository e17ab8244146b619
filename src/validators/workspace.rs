//! Workspace validation: the METS document, the files it references, and the
//! PAGE annotations among them.

use crate::error::{Issue, Report, ValidatorError};
use crate::model::{FileLocation, MetsFile, PageDocument, Workspace};
use crate::registry;
use crate::schema::SchemaRepository;
use crate::types::WorkspaceValidationOptions;
use crate::validators::{PageValidator, XsdMetsValidator, XsdPageValidator, positioned};
use crate::xml;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use url::Url;

static FILE_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^OCR-D-[A-Z0-9][A-Z0-9_-]*$").unwrap());

#[derive(Clone, Debug)]
pub struct WorkspaceValidator {
    mets: XsdMetsValidator,
    page_xsd: XsdPageValidator,
}

impl WorkspaceValidator {
    pub fn new(repo: &SchemaRepository) -> Result<Self, ValidatorError> {
        Ok(WorkspaceValidator {
            mets: XsdMetsValidator::new(repo)?,
            page_xsd: XsdPageValidator::new(repo)?,
        })
    }

    pub fn builtin() -> Result<Self, ValidatorError> {
        let repo = SchemaRepository::builtin()?;
        Self::new(&repo)
    }

    /// Run every workspace check and merge the results. Checks never short-circuit
    /// each other.
    pub fn validate(&self, workspace: &Workspace, options: &WorkspaceValidationOptions) -> Report {
        let mut report = self.mets.validate(&workspace.mets);

        check_unique_identifier(workspace, &mut report);
        check_file_group_names(workspace, &mut report);
        check_file_locations(workspace, options, &mut report);
        if !options.skip_page_checks {
            self.check_pages(workspace, options, &mut report);
        }
        check_agent_file_groups(workspace, &mut report);

        tracing::debug!(
            validator = "workspace",
            files = workspace.descriptor.files.len(),
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            "validated workspace"
        );
        report
    }

    /// Validate a METS document given as bytes. Local files resolve against
    /// `directory`; without one only remote references can be satisfied.
    pub fn validate_bytes(
        &self,
        mets: &[u8],
        directory: Option<&Path>,
        options: &WorkspaceValidationOptions,
    ) -> Report {
        match Workspace::from_bytes(mets, directory) {
            Ok(workspace) => self.validate(&workspace, options),
            Err(e) => Report::single(e.into_issue()),
        }
    }

    /// Validate a METS file on disk; its parent is the workspace directory.
    pub fn validate_path(
        &self,
        mets_path: impl AsRef<Path>,
        options: &WorkspaceValidationOptions,
    ) -> Report {
        match Workspace::from_path(mets_path) {
            Ok(workspace) => self.validate(&workspace, options),
            Err(e) => Report::single(e.into_issue()),
        }
    }

    fn check_pages(
        &self,
        workspace: &Workspace,
        options: &WorkspaceValidationOptions,
        report: &mut Report,
    ) {
        let page_validator = PageValidator::new(options.page.clone());
        let pages = workspace
            .descriptor
            .files
            .iter()
            .filter(|f| f.mimetype.as_deref().is_some_and(registry::is_page));

        for file in pages {
            let path = match &file.location {
                None => continue,
                Some(FileLocation::Remote(url)) => {
                    report.push(positioned(
                        Issue::warning(
                            "page-not-local",
                            format!("PAGE file '{}' is only available remotely at {}", file.id, url),
                        ),
                        file.position,
                    ));
                    continue;
                }
                Some(FileLocation::Local(path)) => path,
            };

            let bytes = match workspace.read_file(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    report.push(positioned(
                        Issue::error(
                            "unreadable-file",
                            format!("PAGE file '{}' cannot be read: {}", file.id, e),
                        ),
                        file.position,
                    ));
                    continue;
                }
            };

            let file_report = match xml::parse_bytes(&bytes) {
                Err(e) => Report::single(e.into_issue()),
                Ok(doc) => {
                    let page = PageDocument::from_xml(&doc);
                    let mut file_report = self.page_xsd.validate(&doc).merge(page_validator.validate(&page));
                    if !options.skip_image_checks {
                        check_image_reference(workspace, &page, &mut file_report);
                    }
                    file_report
                }
            };
            tracing::debug!(file_id = %file.id, issues = file_report.len(), "checked PAGE file");
            report.extend(file_report.with_file(&file.id));
        }
    }
}

fn check_unique_identifier(workspace: &Workspace, report: &mut Report) {
    if workspace.descriptor.unique_identifier.is_none() {
        report.push(positioned(
            Issue::error(
                "missing-unique-identifier",
                "METS document has no mods:identifier of type purl, urn, handle or url",
            ),
            Some((workspace.mets.root.line, workspace.mets.root.column)),
        ));
    }
}

fn check_file_group_names(workspace: &Workspace, report: &mut Report) {
    for group in &workspace.descriptor.file_groups {
        if !FILE_GROUP_RE.is_match(&group.name) {
            report.push(positioned(
                Issue::warning(
                    "file-group-naming",
                    format!("file group '{}' does not follow the OCR-D-* naming convention", group.name),
                ),
                group.position,
            ));
        }
    }
}

fn check_file_locations(
    workspace: &Workspace,
    options: &WorkspaceValidationOptions,
    report: &mut Report,
) {
    for file in &workspace.descriptor.files {
        match &file.location {
            None => report.push(missing_location(file)),
            Some(FileLocation::Remote(url)) => {
                if let Err(e) = Url::parse(url) {
                    report.push(positioned(
                        Issue::error(
                            "invalid-url",
                            format!("file '{}' has malformed URL '{}': {}", file.id, url, e),
                        ),
                        file.position,
                    ));
                }
            }
            Some(FileLocation::Local(path)) => {
                if options.check_file_existence && !workspace.file_exists(path) {
                    report.push(positioned(
                        Issue::error(
                            "file-not-found",
                            format!("file '{}' references missing local file '{}'", file.id, path),
                        ),
                        file.position,
                    ));
                }
            }
        }
    }
}

fn missing_location(file: &MetsFile) -> Issue {
    positioned(
        Issue::error(
            "missing-file-location",
            format!("file '{}' has neither a local path nor a URL", file.id),
        ),
        file.position,
    )
}

/// The PAGE `imageFilename` must name a file of the workspace.
fn check_image_reference(workspace: &Workspace, page: &PageDocument, report: &mut Report) {
    let Some(image) = page.image_filename.as_deref() else {
        return;
    };
    let wanted = FileLocation::from_href(image);
    let target = workspace
        .descriptor
        .files
        .iter()
        .find(|f| f.location.as_ref().is_some_and(|l| same_location(l, &wanted)));
    match target {
        None => report.push(positioned(
            Issue::error(
                "unknown-image-file",
                format!("imageFilename '{}' is not a file of the workspace", image),
            ),
            page.position,
        )),
        Some(target) => {
            // Without a MIMETYPE attribute, fall back to the file extension.
            let mimetype = target
                .mimetype
                .as_deref()
                .or_else(|| registry::guess_mimetype(wanted.as_str()));
            if let Some(mimetype) = mimetype
                && !registry::is_image(mimetype)
            {
                report.push(positioned(
                    Issue::warning(
                        "image-mimetype",
                        format!(
                            "imageFilename '{}' refers to file '{}' of type '{}', not an image",
                            image, target.id, mimetype
                        ),
                    ),
                    page.position,
                ));
            }
        }
    }
}

fn same_location(a: &FileLocation, b: &FileLocation) -> bool {
    match (a, b) {
        (FileLocation::Local(a), FileLocation::Local(b)) => {
            a.trim_start_matches("./") == b.trim_start_matches("./")
        }
        (FileLocation::Remote(a), FileLocation::Remote(b)) => a == b,
        _ => false,
    }
}

fn check_agent_file_groups(workspace: &Workspace, report: &mut Report) {
    let ws = &workspace.descriptor;
    for agent in &ws.agents {
        for group in agent.file_groups() {
            if !ws.has_file_group(group) {
                let name = agent.name.as_deref().unwrap_or("<unnamed agent>");
                report.push(positioned(
                    Issue::error(
                        "undefined-file-group",
                        format!("processing step '{}' references undefined file group '{}'", name, group),
                    ),
                    agent.position,
                ));
            }
        }
    }
}
