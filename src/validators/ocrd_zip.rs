use crate::bag::{BAG_DECLARATION, BAG_INFO, Bag, PAYLOAD_DIR};
use crate::digest;
use crate::error::{Issue, Report, ValidatorError};
use crate::model::Workspace;
use crate::schema::SchemaRepository;
use crate::types::ZipValidationOptions;
use crate::validators::WorkspaceValidator;
use crate::xml;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Checks an OCRD-ZIP bag: manifest digests, the BagIt profile, and the
/// contained workspace (issues prefixed `workspace:`).
#[derive(Clone, Debug)]
pub struct OcrdZipValidator {
    workspace: WorkspaceValidator,
}

impl OcrdZipValidator {
    pub fn new(repo: &SchemaRepository) -> Result<Self, ValidatorError> {
        Ok(OcrdZipValidator {
            workspace: WorkspaceValidator::new(repo)?,
        })
    }

    pub fn builtin() -> Result<Self, ValidatorError> {
        let repo = SchemaRepository::builtin()?;
        Self::new(&repo)
    }

    pub fn validate(&self, bag: &Bag, options: &ZipValidationOptions) -> Report {
        let mut report = Report::new();

        for path in bag.unsafe_paths() {
            report.push(Issue::error(
                "unsafe-bag-path",
                format!("archive entry '{}' escapes the bag root", path),
            ));
        }
        if !options.skip_bag {
            check_profile(bag, &mut report);
        }
        check_manifests(bag, options, &mut report);
        report.extend(self.check_workspace(bag, options));

        tracing::debug!(
            validator = "ocrd-zip",
            entries = bag.paths().count(),
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            "validated bag"
        );
        report
    }

    /// Validate a zip archive held in memory.
    pub fn validate_bytes(&self, bytes: &[u8], options: &ZipValidationOptions) -> Report {
        match Bag::from_zip_bytes(bytes) {
            Ok(bag) => self.validate(&bag, options),
            Err(e) => Report::single(e.into_issue()),
        }
    }

    pub fn validate_path(&self, path: impl AsRef<Path>, options: &ZipValidationOptions) -> Report {
        match Bag::from_path(path) {
            Ok(bag) => self.validate(&bag, options),
            Err(e) => Report::single(e.into_issue()),
        }
    }

    fn check_workspace(&self, bag: &Bag, options: &ZipValidationOptions) -> Report {
        let mets_path = bag.mets_path();
        let Some(mets) = bag.get(&mets_path) else {
            return Report::single(Issue::error(
                "missing-mets",
                format!("bag does not contain the METS document '{}'", mets_path),
            ));
        };

        // A missing METS is a bag issue; everything below belongs to the workspace.
        let report = match xml::parse_bytes(mets) {
            Err(e) => Report::single(e.into_issue()),
            Ok(doc) => {
                // File references resolve against the METS file's directory.
                let base = match mets_path.rfind('/') {
                    Some(idx) => &mets_path[..=idx],
                    None => PAYLOAD_DIR,
                };
                let contents: HashMap<String, Vec<u8>> = bag
                    .payload()
                    .filter_map(|(path, bytes)| {
                        path.strip_prefix(base)
                            .map(|rel| (rel.to_string(), bytes.to_vec()))
                    })
                    .collect();
                let workspace = Workspace::from_document(doc, None).with_contents(contents);
                self.workspace.validate(&workspace, &options.workspace)
            }
        };
        report.with_category_prefix("workspace")
    }
}

fn check_profile(bag: &Bag, report: &mut Report) {
    if bag.declaration().is_none() {
        report.push(Issue::error(
            "missing-bag-declaration",
            format!("bag has no {}", BAG_DECLARATION),
        ));
    }

    let has_identifier = bag
        .info_value("Ocrd-Identifier")
        .is_some_and(|v| !v.trim().is_empty());
    if !has_identifier {
        report.push(Issue::error(
            "missing-bag-info-tag",
            format!("{} has no Ocrd-Identifier tag", BAG_INFO),
        ));
    }

    if let Some(oxum) = bag.info_value("Payload-Oxum") {
        let (octets, streams) = bag
            .payload()
            .fold((0u64, 0u64), |(o, s), (_, bytes)| (o + bytes.len() as u64, s + 1));
        let actual = format!("{}.{}", octets, streams);
        if oxum.trim() != actual {
            report.push(Issue::error(
                "payload-oxum-mismatch",
                format!("Payload-Oxum is '{}', payload has {}", oxum.trim(), actual),
            ));
        }
    }

    let manifests = bag.manifests();
    if manifests.is_empty() {
        report.push(Issue::error(
            "missing-bag-manifest",
            "bag has no payload manifest (manifest-<alg>.txt)",
        ));
        return;
    }

    let mut listed: HashSet<&str> = HashSet::new();
    for manifest in &manifests {
        if manifest.algorithm.is_none() {
            report.push(Issue::error(
                "unsupported-checksum-algorithm",
                format!(
                    "{} uses unsupported algorithm '{}'",
                    manifest.file, manifest.algorithm_name
                ),
            ));
        }
        for line in &manifest.malformed_lines {
            report.push(Issue::error(
                "malformed-bag-manifest",
                format!("{} line {} is not '<digest> <path>'", manifest.file, line),
            ));
        }
        for entry in &manifest.entries {
            listed.insert(entry.path.as_str());
            if !bag.contains(&entry.path) {
                report.push(Issue::error(
                    "bag-missing-file",
                    format!(
                        "{} line {} lists '{}', which is not in the bag",
                        manifest.file, entry.line, entry.path
                    ),
                ));
            }
        }
    }

    for (path, _) in bag.payload() {
        if !listed.contains(path) {
            report.push(Issue::error(
                "bag-unlisted-file",
                format!("payload file '{}' is not listed in any manifest", path),
            ));
        }
    }
}

/// Compare every manifest digest with the actual bytes. A mismatch does not
/// stop the remaining entries from being checked.
fn check_manifests(bag: &Bag, options: &ZipValidationOptions, report: &mut Report) {
    if options.skip_checksums {
        return;
    }
    for manifest in bag.manifests() {
        let Some(algorithm) = manifest.algorithm else {
            continue;
        };
        for entry in &manifest.entries {
            let Some(bytes) = bag.get(&entry.path) else {
                continue;
            };
            let actual = digest::compute(algorithm, bytes);
            if actual != entry.digest {
                report.push(Issue::error(
                    "bag-checksum-mismatch",
                    format!(
                        "'{}' has {} digest {}, {} declares {}",
                        entry.path, algorithm, actual, manifest.file, entry.digest
                    ),
                ));
            }
        }
    }
}
