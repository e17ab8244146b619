//! Minimal namespace-aware XML tree built on `quick-xml`.
//!
//! Every element remembers the 1-based line/column of its start tag so that
//! grammar and semantic checks can point at the offending markup.

use crate::error::{ParseError, ParseErrorKind};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Deepest element nesting accepted by [`parse_bytes`].
pub const MAX_DEPTH: usize = 256;

/// A parsed XML document.
#[derive(Clone, Debug, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XmlAttribute {
    /// Qualified name as written, e.g. `xlink:href`.
    pub name: String,
    pub local_name: String,
    pub namespace: Option<String>,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `mets:file`.
    pub name: String,
    pub local_name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlElement>,
    /// Concatenated character data directly inside this element.
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl XmlElement {
    /// Value of the first attribute with this local name and no namespace.
    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    pub fn attr_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local_name == local_name
    }

    /// Direct children with the given local name, regardless of namespace.
    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.local_name == local_name)
    }

    pub fn child(&self, local_name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.local_name == local_name)
    }

    /// All descendants in document order, excluding `self`.
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        let mut pending: Vec<&XmlElement> = self.children.iter().rev().collect();
        while let Some(el) = pending.pop() {
            out.push(el);
            pending.extend(el.children.iter().rev());
        }
        out
    }
}

/// Parse a UTF-8 string into an [`XmlDocument`].
pub fn parse_str(input: &str) -> Result<XmlDocument, ParseError> {
    parse_bytes(input.as_bytes())
}

/// Parse raw bytes into an [`XmlDocument`].
///
/// Fails on anything that is not well-formed: mismatched or unclosed tags,
/// bad attribute syntax, undeclared namespace prefixes, invalid UTF-8, missing
/// or multiple root elements, and nesting deeper than [`MAX_DEPTH`].
pub fn parse_bytes(input: &[u8]) -> Result<XmlDocument, ParseError> {
    let lines = LineIndex::new(input);
    let mut reader = NsReader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| lines.error(reader.error_position() as usize, e.to_string()))?;
        match event {
            Event::Start(start) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(lines.error(
                        lines.tag_start(before),
                        format!("elements nested deeper than {} levels", MAX_DEPTH),
                    ));
                }
                let el = open_element(&reader, &start, &lines, before)?;
                stack.push(el);
            }
            Event::Empty(start) => {
                let el = open_element(&reader, &start, &lines, before)?;
                close_element(&lines, el, &mut stack, &mut root, before)?;
            }
            Event::End(_) => match stack.pop() {
                Some(el) => close_element(&lines, el, &mut stack, &mut root, before)?,
                None => return Err(lines.error(before, "unexpected closing tag".to_string())),
            },
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| lines.error(before, e.to_string()))?;
                match stack.last_mut() {
                    Some(el) => el.text.push_str(&value),
                    None => {
                        return Err(lines.error(
                            before,
                            "character data outside of the root element".to_string(),
                        ));
                    }
                }
            }
            Event::CData(data) => {
                let value = data.decode().map_err(|e| lines.error(before, e.to_string()))?;
                if let Some(el) = stack.last_mut() {
                    el.text.push_str(&value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError {
            kind: ParseErrorKind::Syntax,
            message: format!("unclosed element '{}'", open.name),
            line: Some(open.line),
            column: Some(open.column),
        });
    }

    root.map(|root| XmlDocument { root })
        .ok_or_else(|| ParseError::syntax("document has no root element"))
}

fn open_element(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    lines: &LineIndex,
    offset: usize,
) -> Result<XmlElement, ParseError> {
    let offset = lines.tag_start(offset);
    let (line, column) = lines.line_column(offset);
    let name = lines.utf8(start.name().as_ref(), offset)?;
    let (resolved, local) = reader.resolve_element(start.name());
    let namespace = match resolved {
        ResolveResult::Bound(Namespace(uri)) => Some(lines.utf8(uri, offset)?),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(_) => {
            return Err(lines.error(
                offset,
                format!("undeclared namespace prefix in element '{}'", name),
            ));
        }
    };
    let local_name = lines.utf8(local.as_ref(), offset)?;

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| lines.error(offset, e.to_string()))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = lines.utf8(attr.key.as_ref(), offset)?;
        let (resolved, attr_local) = reader.resolve_attribute(attr.key);
        let attr_ns = match resolved {
            // Unprefixed attributes are in no namespace.
            ResolveResult::Unbound => None,
            ResolveResult::Bound(Namespace(uri)) => Some(lines.utf8(uri, offset)?),
            ResolveResult::Unknown(_) => {
                return Err(lines.error(
                    offset,
                    format!("undeclared namespace prefix in attribute '{}'", key),
                ));
            }
        };
        let value = attr
            .unescape_value()
            .map_err(|e| lines.error(offset, e.to_string()))?
            .into_owned();
        attributes.push(XmlAttribute {
            local_name: lines.utf8(attr_local.as_ref(), offset)?,
            name: key,
            namespace: attr_ns,
            value,
        });
    }

    Ok(XmlElement {
        name,
        local_name,
        namespace,
        attributes,
        children: Vec::new(),
        text: String::new(),
        line,
        column,
    })
}

fn close_element(
    lines: &LineIndex,
    el: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    offset: usize,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None => {
            if root.is_some() {
                return Err(lines.error(offset, "junk after document element".to_string()));
            }
            *root = Some(el);
        }
    }
    Ok(())
}

// ─── Positions ──────────────────────────────────────────────────────────────

/// Newline offsets of the input, built once per parse.
struct LineIndex<'a> {
    input: &'a [u8],
    newlines: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(input: &'a [u8]) -> Self {
        let newlines = input
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == b'\n')
            .map(|(i, _)| i)
            .collect();
        LineIndex { input, newlines }
    }

    /// 1-based line and column of a byte offset.
    fn line_column(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.input.len());
        let line = self.newlines.partition_point(|nl| *nl < offset);
        let column = match line {
            0 => offset + 1,
            n => offset - self.newlines[n - 1],
        };
        (line + 1, column)
    }

    /// Offset of the first `<` at or after `offset`. The reader position
    /// before a tag may still sit in front of skipped whitespace.
    fn tag_start(&self, offset: usize) -> usize {
        let start = offset.min(self.input.len());
        self.input[start..]
            .iter()
            .position(|b| *b == b'<')
            .map_or(start, |p| start + p)
    }

    fn utf8(&self, bytes: &[u8], offset: usize) -> Result<String, ParseError> {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| self.error(offset, format!("invalid UTF-8: {}", e)))
    }

    fn error(&self, offset: usize, message: String) -> ParseError {
        let (line, column) = self.line_column(offset);
        ParseError {
            kind: ParseErrorKind::Syntax,
            message,
            line: Some(line),
            column: Some(column),
        }
    }
}
