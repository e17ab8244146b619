/// An entry in the mimetype registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MimetypeEntry {
    pub mimetype: &'static str,
    pub kind: MediaKind,
    pub extensions: &'static [&'static str],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Page,
    Mets,
    Alto,
    Image,
    Text,
}

pub const MIMETYPE_PAGE: &str = "application/vnd.prima.page+xml";

/// Mimetypes a workspace is expected to carry.
pub static MIMETYPE_REGISTRY: &[MimetypeEntry] = &[
    // Annotations
    MimetypeEntry {
        mimetype: MIMETYPE_PAGE,
        kind: MediaKind::Page,
        extensions: &["xml"],
    },
    MimetypeEntry {
        mimetype: "application/alto+xml",
        kind: MediaKind::Alto,
        extensions: &["xml"],
    },
    MimetypeEntry {
        mimetype: "application/mets+xml",
        kind: MediaKind::Mets,
        extensions: &["xml"],
    },
    MimetypeEntry {
        mimetype: "text/plain",
        kind: MediaKind::Text,
        extensions: &["txt"],
    },
    // Images
    MimetypeEntry {
        mimetype: "image/tiff",
        kind: MediaKind::Image,
        extensions: &["tif", "tiff"],
    },
    MimetypeEntry {
        mimetype: "image/png",
        kind: MediaKind::Image,
        extensions: &["png"],
    },
    MimetypeEntry {
        mimetype: "image/jpeg",
        kind: MediaKind::Image,
        extensions: &["jpg", "jpeg"],
    },
    MimetypeEntry {
        mimetype: "image/jp2",
        kind: MediaKind::Image,
        extensions: &["jp2"],
    },
    MimetypeEntry {
        mimetype: "image/x-portable-pixmap",
        kind: MediaKind::Image,
        extensions: &["ppm"],
    },
];

/// Look up a registry entry by mimetype. Parameters after `;` are ignored.
pub fn lookup_mimetype(mimetype: &str) -> Option<&'static MimetypeEntry> {
    let base = mimetype.split(';').next().unwrap_or(mimetype).trim();
    MIMETYPE_REGISTRY.iter().find(|e| e.mimetype == base)
}

pub fn is_page(mimetype: &str) -> bool {
    lookup_mimetype(mimetype).is_some_and(|e| e.kind == MediaKind::Page)
}

pub fn is_image(mimetype: &str) -> bool {
    lookup_mimetype(mimetype).is_some_and(|e| e.kind == MediaKind::Image)
}

/// Guess a mimetype from a path's extension: "OCR-D-IMG/0001.tif" -> "image/tiff".
/// XML files are ambiguous and yield `None`.
pub fn guess_mimetype(path: &str) -> Option<&'static str> {
    let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
    let mut matches = MIMETYPE_REGISTRY
        .iter()
        .filter(|e| e.extensions.contains(&ext.as_str()));
    let first = matches.next()?;
    match matches.next() {
        Some(_) => None,
        None => Some(first.mimetype),
    }
}
