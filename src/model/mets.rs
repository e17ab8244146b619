//! METS document → [`WorkspaceDescriptor`].
//!
//! Extraction is best-effort: whatever the grammar check rejects is skipped
//! here rather than reported twice.

use crate::xml::{XmlDocument, XmlElement};
use std::collections::HashMap;

pub const METS_NS: &str = "http://www.loc.gov/METS/";
pub const MODS_NS: &str = "http://www.loc.gov/mods/v3";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// `mods:identifier` types accepted as the workspace's unique identifier, in
/// order of preference.
const IDENTIFIER_TYPES: &[&str] = &["purl", "urn", "handle", "url"];

/// In-memory structure of a parsed METS document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkspaceDescriptor {
    pub unique_identifier: Option<String>,
    pub file_groups: Vec<FileGroup>,
    pub files: Vec<MetsFile>,
    pub agents: Vec<Agent>,
    /// Physical page ids in structMap order.
    pub page_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FileGroup {
    pub name: String,
    pub position: Option<(usize, usize)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetsFile {
    pub id: String,
    pub file_group: String,
    pub mimetype: Option<String>,
    pub location: Option<FileLocation>,
    pub page_id: Option<String>,
    pub position: Option<(usize, usize)>,
}

/// Where a file's content lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileLocation {
    /// Path relative to the workspace directory (or absolute).
    Local(String),
    /// Anything with a `scheme://` prefix other than `file://`.
    Remote(String),
}

impl FileLocation {
    pub fn from_href(href: &str) -> Self {
        let href = href.trim();
        if let Some(path) = href.strip_prefix("file://") {
            return FileLocation::Local(path.to_string());
        }
        if href.contains("://") {
            FileLocation::Remote(href.to_string())
        } else {
            FileLocation::Local(href.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FileLocation::Local(s) | FileLocation::Remote(s) => s,
        }
    }
}

/// A processing step recorded as a METS agent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Agent {
    pub name: Option<String>,
    /// `OTHERROLE`, e.g. `preprocessing/optimization/binarization`.
    pub role: Option<String>,
    pub input_file_grps: Vec<String>,
    pub output_file_grps: Vec<String>,
    /// Raw JSON of the parameters the step ran with.
    pub parameters: Option<String>,
    pub position: Option<(usize, usize)>,
}

impl Agent {
    /// All file groups the step read or wrote.
    pub fn file_groups(&self) -> impl Iterator<Item = &str> {
        self.input_file_grps
            .iter()
            .chain(&self.output_file_grps)
            .map(String::as_str)
    }
}

impl WorkspaceDescriptor {
    pub fn from_xml(doc: &XmlDocument) -> Self {
        let root = &doc.root;
        let mut ws = WorkspaceDescriptor {
            unique_identifier: find_identifier(root),
            ..Default::default()
        };

        let page_of_file = collect_pages(root, &mut ws.page_ids);

        if let Some(header) = mets_child(root, "metsHdr") {
            for agent in header.children.iter().filter(|c| c.is(METS_NS, "agent")) {
                ws.agents.push(read_agent(agent));
            }
        }

        if let Some(file_sec) = mets_child(root, "fileSec") {
            for grp in file_sec.children.iter().filter(|c| c.is(METS_NS, "fileGrp")) {
                collect_group(grp, &page_of_file, &mut ws);
            }
        }
        ws
    }

    pub fn file(&self, id: &str) -> Option<&MetsFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn has_file_group(&self, name: &str) -> bool {
        self.file_groups.iter().any(|g| g.name == name)
    }
}

fn mets_child<'a>(el: &'a XmlElement, local: &str) -> Option<&'a XmlElement> {
    el.children.iter().find(|c| c.is(METS_NS, local))
}

fn find_identifier(root: &XmlElement) -> Option<String> {
    let identifiers: Vec<&XmlElement> = root
        .descendants()
        .into_iter()
        .filter(|el| el.is(MODS_NS, "identifier"))
        .collect();
    IDENTIFIER_TYPES.iter().find_map(|wanted| {
        identifiers
            .iter()
            .find(|el| el.attr("type") == Some(*wanted))
            .map(|el| el.text.trim().to_string())
            .filter(|text| !text.is_empty())
    })
}

/// Walk the physical structMap. Returns file id → page id.
fn collect_pages(root: &XmlElement, page_ids: &mut Vec<String>) -> HashMap<String, String> {
    let mut page_of_file = HashMap::new();
    let physical = root
        .children
        .iter()
        .filter(|c| c.is(METS_NS, "structMap"))
        .find(|c| c.attr("TYPE") == Some("PHYSICAL"));
    let Some(physical) = physical else {
        return page_of_file;
    };
    for div in physical.descendants() {
        if !div.is(METS_NS, "div") || div.attr("TYPE") != Some("page") {
            continue;
        }
        let Some(page_id) = div.attr("ID") else {
            continue;
        };
        page_ids.push(page_id.to_string());
        for fptr in div.children.iter().filter(|c| c.is(METS_NS, "fptr")) {
            if let Some(file_id) = fptr.attr("FILEID") {
                page_of_file
                    .entry(file_id.to_string())
                    .or_insert_with(|| page_id.to_string());
            }
        }
    }
    page_of_file
}

fn read_agent(el: &XmlElement) -> Agent {
    let mut agent = Agent {
        name: mets_child(el, "name").map(|n| n.text.trim().to_string()),
        role: el.attr("OTHERROLE").map(str::to_string),
        position: Some((el.line, el.column)),
        ..Default::default()
    };
    for note in el.children.iter().filter(|c| c.is(METS_NS, "note")) {
        // OCR-D writes `ocrd:option`; older workspaces use `ocrd:type`.
        let option = note
            .attributes
            .iter()
            .find(|a| a.local_name == "option" || a.local_name == "type")
            .map(|a| a.value.as_str());
        let text = note.text.trim();
        match option {
            Some("input-file-grp") => agent.input_file_grps.extend(split_groups(text)),
            Some("output-file-grp") => agent.output_file_grps.extend(split_groups(text)),
            Some("parameter") | Some("parameters") if !text.is_empty() => {
                agent.parameters = Some(text.to_string())
            }
            _ => {}
        }
    }
    agent
}

fn split_groups(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn collect_group(
    grp: &XmlElement,
    page_of_file: &HashMap<String, String>,
    ws: &mut WorkspaceDescriptor,
) {
    let name = grp.attr("USE").unwrap_or_default().to_string();
    ws.file_groups.push(FileGroup {
        name: name.clone(),
        position: Some((grp.line, grp.column)),
    });
    for child in &grp.children {
        if child.is(METS_NS, "fileGrp") {
            collect_group(child, page_of_file, ws);
        } else if child.is(METS_NS, "file") {
            let id = child.attr("ID").unwrap_or_default().to_string();
            let location = child
                .children
                .iter()
                .filter(|c| c.is(METS_NS, "FLocat"))
                .find_map(|loc| loc.attr_ns(XLINK_NS, "href"))
                .filter(|href| !href.trim().is_empty())
                .map(FileLocation::from_href);
            ws.files.push(MetsFile {
                page_id: page_of_file.get(&id).cloned(),
                id,
                file_group: name.clone(),
                mimetype: child.attr("MIMETYPE").map(str::to_string),
                location,
                position: Some((child.line, child.column)),
            });
        }
    }
}
