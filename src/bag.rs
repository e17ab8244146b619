//! Reading packaged document bags (BagIt layout inside a zip archive).
//!
//! A bag is held fully in memory as `relative path → bytes`. Entries whose
//! names would escape the bag root are never stored; their names are kept so
//! the validator can report them.

use crate::enums::DigestAlgorithm;
use crate::error::{ParseError, ParseErrorKind};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

pub const BAG_DECLARATION: &str = "bagit.txt";
pub const BAG_INFO: &str = "bag-info.txt";
pub const PAYLOAD_DIR: &str = "data/";
pub const DEFAULT_METS: &str = "mets.xml";

/// Largest archive entry read into memory.
pub const MAX_ENTRY_BYTES: u64 = 1 << 30;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bag {
    entries: BTreeMap<String, Vec<u8>>,
    unsafe_paths: Vec<String>,
}

/// One `manifest-<alg>.txt` file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    /// Tag file name, e.g. `manifest-sha512.txt`.
    pub file: String,
    /// Algorithm as written in the file name.
    pub algorithm_name: String,
    /// `None` when the algorithm is not supported.
    pub algorithm: Option<DigestAlgorithm>,
    pub entries: Vec<ManifestEntry>,
    /// 1-based line numbers of lines that are not `<digest> <path>`.
    pub malformed_lines: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    pub digest: String,
    pub path: String,
    pub line: usize,
}

impl Bag {
    /// Build a bag from `(path, bytes)` pairs. Directory entries (trailing
    /// `/`) are skipped.
    pub fn from_entries<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, Vec<u8>)>,
        P: Into<String>,
    {
        let mut bag = Bag::default();
        for (path, bytes) in entries {
            bag.insert(path.into(), bytes);
        }
        bag
    }

    fn insert(&mut self, path: String, bytes: Vec<u8>) {
        if path.ends_with('/') {
            return;
        }
        match safe_relative(&path) {
            Some(clean) => {
                self.entries.insert(clean, bytes);
            }
            None => self.unsafe_paths.push(path),
        }
    }

    /// Read a zip archive held in memory.
    pub fn from_zip_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(zip_error)?;
        let mut bag = Bag::default();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).map_err(zip_error)?;
            let name = file.name().to_string();
            if file.is_dir() {
                continue;
            }
            if file.enclosed_name().is_none() {
                bag.unsafe_paths.push(name);
                continue;
            }
            // The declared size is untrusted; the buffer grows with the data
            // actually inflated, up to the entry limit.
            if file.size() > MAX_ENTRY_BYTES {
                return Err(too_large(&name));
            }
            let mut content = Vec::new();
            file.by_ref()
                .take(MAX_ENTRY_BYTES + 1)
                .read_to_end(&mut content)
                .map_err(|e| ParseError {
                    kind: ParseErrorKind::Io,
                    message: format!("failed to read '{}' from archive: {}", name, e),
                    line: None,
                    column: None,
                })?;
            if content.len() as u64 > MAX_ENTRY_BYTES {
                return Err(too_large(&name));
            }
            bag.insert(name, content);
        }
        Ok(bag)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ParseError {
            kind: ParseErrorKind::Io,
            message: format!("{}: {}", path.display(), e),
            line: None,
            column: None,
        })?;
        Self::from_zip_bytes(&bytes)
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Paths under `data/`, sorted.
    pub fn payload(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries
            .iter()
            .filter(|(p, _)| p.starts_with(PAYLOAD_DIR))
            .map(|(p, b)| (p.as_str(), b.as_slice()))
    }

    /// Archive entry names rejected because they escape the bag root.
    pub fn unsafe_paths(&self) -> &[String] {
        &self.unsafe_paths
    }

    /// `bagit.txt` as key/value tags, if present.
    pub fn declaration(&self) -> Option<Vec<(String, String)>> {
        self.get(BAG_DECLARATION).map(parse_tags)
    }

    /// `bag-info.txt` as key/value tags, if present.
    pub fn info(&self) -> Option<Vec<(String, String)>> {
        self.get(BAG_INFO).map(parse_tags)
    }

    /// First value of a `bag-info.txt` tag. Tag names compare case-insensitively.
    pub fn info_value(&self, tag: &str) -> Option<String> {
        self.info()?
            .into_iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(tag))
            .map(|(_, v)| v)
    }

    /// Payload manifests (`manifest-<alg>.txt`), sorted by file name.
    pub fn manifests(&self) -> Vec<Manifest> {
        self.entries
            .iter()
            .filter_map(|(path, bytes)| {
                let alg = path.strip_prefix("manifest-")?.strip_suffix(".txt")?;
                Some(parse_manifest(path, alg, bytes))
            })
            .collect()
    }

    /// Path of the METS document inside the bag, from `Ocrd-Mets` or the
    /// default `data/mets.xml`.
    pub fn mets_path(&self) -> String {
        let mets = self
            .info_value("Ocrd-Mets")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_METS.to_string());
        format!("{}{}", PAYLOAD_DIR, mets.trim().trim_start_matches("./"))
    }
}

/// Normalize an archive entry name. `None` if it is absolute or climbs out
/// of the root.
fn safe_relative(path: &str) -> Option<String> {
    let path = path.replace('\\', "/");
    if path.starts_with('/') || path.contains(':') {
        return None;
    }
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => return None,
            p => parts.push(p),
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

fn parse_tags(bytes: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(bytes);
    let mut tags: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        if line.starts_with([' ', '\t']) {
            // Continuation of the previous value.
            if let Some(last) = tags.last_mut() {
                last.1.push(' ');
                last.1.push_str(line.trim());
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            tags.push((key.trim().to_string(), value.trim().to_string()));
        }
    }
    tags
}

fn parse_manifest(file: &str, algorithm_name: &str, bytes: &[u8]) -> Manifest {
    let text = String::from_utf8_lossy(bytes);
    let mut entries = Vec::new();
    let mut malformed_lines = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once(char::is_whitespace) {
            Some((digest, path)) if !path.trim().is_empty() => {
                let path = unescape_manifest_path(path.trim());
                entries.push(ManifestEntry {
                    digest: digest.to_ascii_lowercase(),
                    // Escaping paths stay as written and never match an entry.
                    path: safe_relative(&path).unwrap_or(path),
                    line: line_no,
                })
            }
            _ => malformed_lines.push(line_no),
        }
    }
    Manifest {
        file: file.to_string(),
        algorithm_name: algorithm_name.to_string(),
        algorithm: DigestAlgorithm::from_name(algorithm_name),
        entries,
        malformed_lines,
    }
}

/// Undo the manifest escapes BagIt defines: `%0D`, `%0A` and `%25`.
fn unescape_manifest_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(i) = rest.find('%') {
        out.push_str(&rest[..i]);
        let tail = &rest[i..];
        let decoded = match tail.get(1..3) {
            Some(code) if code.eq_ignore_ascii_case("0d") => Some('\r'),
            Some(code) if code.eq_ignore_ascii_case("0a") => Some('\n'),
            Some("25") => Some('%'),
            _ => None,
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &tail[3..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn too_large(name: &str) -> ParseError {
    ParseError {
        kind: ParseErrorKind::Syntax,
        message: format!("archive entry '{}' exceeds {} bytes", name, MAX_ENTRY_BYTES),
        line: None,
        column: None,
    }
}

fn zip_error(e: zip::result::ZipError) -> ParseError {
    ParseError {
        kind: ParseErrorKind::Syntax,
        message: format!("not a readable zip archive: {}", e),
        line: None,
        column: None,
    }
}
