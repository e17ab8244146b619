use crate::error::{ParseError, ParseErrorKind};
use crate::model::mets::WorkspaceDescriptor;
use crate::xml::{self, XmlDocument};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A METS document together with the place its files are resolved against.
///
/// Local file references resolve first against the in-memory `contents`
/// (keyed by path relative to the METS file), then against `directory`.
#[derive(Clone, Debug)]
pub struct Workspace {
    pub mets: XmlDocument,
    pub descriptor: WorkspaceDescriptor,
    pub directory: Option<PathBuf>,
    contents: HashMap<String, Vec<u8>>,
}

impl Workspace {
    pub fn from_document(mets: XmlDocument, directory: Option<PathBuf>) -> Self {
        let descriptor = WorkspaceDescriptor::from_xml(&mets);
        Workspace {
            mets,
            descriptor,
            directory,
            contents: HashMap::new(),
        }
    }

    pub fn from_bytes(mets: &[u8], directory: Option<&Path>) -> Result<Self, ParseError> {
        let doc = xml::parse_bytes(mets)?;
        Ok(Self::from_document(doc, directory.map(Path::to_path_buf)))
    }

    /// Read a METS file from disk. The workspace directory is its parent.
    pub fn from_path(mets_path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let mets_path = mets_path.as_ref();
        let bytes = std::fs::read(mets_path).map_err(|e| ParseError {
            kind: ParseErrorKind::Io,
            message: format!("{}: {}", mets_path.display(), e),
            line: None,
            column: None,
        })?;
        let directory = mets_path
            .parent()
            .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p });
        Self::from_bytes(&bytes, directory)
    }

    pub fn with_contents(mut self, contents: HashMap<String, Vec<u8>>) -> Self {
        for (path, bytes) in contents {
            self.insert_content(&path, bytes);
        }
        self
    }

    pub fn insert_content(&mut self, path: &str, bytes: Vec<u8>) {
        self.contents.insert(normalize(path).to_string(), bytes);
    }

    pub fn file_exists(&self, path: &str) -> bool {
        if self.contents.contains_key(normalize(path)) {
            return true;
        }
        self.resolve(path)
            .is_some_and(|p| std::fs::metadata(p).is_ok_and(|m| m.is_file()))
    }

    pub fn read_file(&self, path: &str) -> Result<Cow<'_, [u8]>, String> {
        if let Some(bytes) = self.contents.get(normalize(path)) {
            return Ok(Cow::Borrowed(bytes));
        }
        let Some(resolved) = self.resolve(path) else {
            return Err(format!("'{}' is not available in memory and the workspace has no directory", path));
        };
        std::fs::read(&resolved)
            .map(Cow::Owned)
            .map_err(|e| format!("{}: {}", resolved.display(), e))
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let p = Path::new(path);
        if p.is_absolute() {
            return Some(p.to_path_buf());
        }
        self.directory.as_ref().map(|dir| dir.join(normalize(path)))
    }
}

fn normalize(path: &str) -> &str {
    let mut path = path.trim();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path
}
