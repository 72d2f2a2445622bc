/// Trivia-preserving XML reader and verbatim writer.
///
/// The merge engine's contract is tree-in/tree-out; this module supplies the
/// tree. Reading drives `quick-xml`'s event stream over a UTF-8 string and
/// slices each event's verbatim text out of the input by byte position, so
/// nothing the tokenizer saw is lost. Start tags are re-scanned for
/// per-attribute spans (gap, quote character, escaped value text) because the
/// event API does not expose them and byte-exact output needs them.
///
/// Writing is pure concatenation of the stored verbatim pieces:
/// `write_document(parse_document(s)?) == s` for any well-formed input.
use std::fmt;

use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;

use crate::tree::{
    Attribute, Comment, DocumentTree, Element, Node, NodeId, NodeKind, Text, is_xml_whitespace,
};

/// Pseudo-URI recorded for `xmlns` / `xmlns:*` declaration attributes.
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

// ---------------------------------------------------------------------------
// XmlError
// ---------------------------------------------------------------------------

/// Failures while turning input text into a [`DocumentTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// The tokenizer rejected the input, or a tag could not be scanned.
    Syntax {
        /// Description of the failure.
        detail: String,
        /// Source line (1-based) where the failure was detected.
        line: u32,
    },
    /// The document contains no element at all.
    NoRootElement,
    /// A second top-level element was found after the root closed.
    MultipleRootElements {
        /// Source line of the second root.
        line: u32,
    },
    /// End of input was reached with elements still open.
    UnclosedElement {
        /// Name of the innermost unclosed element.
        name: String,
    },
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { detail, line } => write!(f, "XML syntax error at line {line}: {detail}"),
            Self::NoRootElement => f.write_str("document has no root element"),
            Self::MultipleRootElements { line } => {
                write!(f, "second root element at line {line}")
            }
            Self::UnclosedElement { name } => {
                write!(f, "element <{name}> is never closed")
            }
        }
    }
}

impl std::error::Error for XmlError {}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Parses one XML document into a [`DocumentTree`] labelled `label`.
///
/// The parser accepts any root element name: a library document whose root is
/// not `manifest` must reach the engine so it can be *reported*, not die in
/// the codec.
///
/// # Errors
///
/// Returns [`XmlError`] on ill-formed input (tokenizer failure, unquoted
/// attribute, unclosed element, multiple roots, no element at all).
pub fn parse_document(input: &str, label: &str) -> Result<DocumentTree, XmlError> {
    let mut reader = Reader::from_str(input);
    // End-tag pairing is load-bearing for the open-element stack below.
    reader.config_mut().check_end_names = true;

    let mut nodes: Vec<Node> = Vec::new();
    let mut prologue = String::new();
    let mut epilogue = String::new();
    let mut root: Option<NodeId> = None;
    // Open elements, innermost last.
    let mut stack: Vec<NodeId> = Vec::new();
    let mut ns = NamespaceStack::new();
    let mut line: u32 = 1;
    let mut pos: usize = 0;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                let at = line_of_offset(input, reader.error_position() as usize);
                return Err(XmlError::Syntax {
                    detail: e.to_string(),
                    line: at,
                });
            }
        };
        let end = reader.buffer_position() as usize;
        let raw = &input[pos..end];
        let event_line = line;
        line += count_newlines(raw);
        pos = end;

        match &event {
            Event::Start(_) | Event::Empty(_) => {
                let self_closing = matches!(&event, Event::Empty(_));
                if stack.is_empty() && root.is_some() {
                    return Err(XmlError::MultipleRootElements { line: event_line });
                }
                let scanned = scan_start_tag(raw, self_closing).map_err(|detail| {
                    XmlError::Syntax {
                        detail,
                        line: event_line,
                    }
                })?;
                ns.push_scope(&scanned);
                let element = build_element(&scanned, self_closing, event_line, &ns)?;
                let id = push(
                    &mut nodes,
                    Node {
                        kind: NodeKind::Element(element),
                        parent: None,
                        file: 0,
                        line: event_line,
                    },
                );
                match stack.last() {
                    Some(&parent) => attach(&mut nodes, parent, id),
                    None => root = Some(id),
                }
                if self_closing {
                    ns.pop_scope();
                } else {
                    stack.push(id);
                }
            }

            Event::End(_) => {
                if let Some(closed) = stack.pop() {
                    if let NodeKind::Element(e) = &mut nodes[closed.index()].kind {
                        e.close = Some(raw.to_owned());
                    }
                    ns.pop_scope();
                }
            }

            Event::Comment(_) => match stack.last() {
                Some(&parent) => {
                    let id = push(&mut nodes, comment_node(raw, event_line));
                    attach(&mut nodes, parent, id);
                }
                None if root.is_none() => prologue.push_str(raw),
                None => epilogue.push_str(raw),
            },

            Event::Eof => {
                if let Some(&open) = stack.last() {
                    let name = match &nodes[open.index()].kind {
                        NodeKind::Element(e) => e.name.clone(),
                        NodeKind::Comment(_) | NodeKind::Text(_) => String::new(),
                    };
                    return Err(XmlError::UnclosedElement { name });
                }
                break;
            }

            // Character data of every remaining flavor — text, CDATA,
            // declarations, doctype, processing instructions, entity
            // references — is preserved verbatim. The catch-all keeps this
            // tolerant of tokenizer event kinds added in minor releases.
            Event::Text(_) | Event::CData(_) | Event::Decl(_) | _ => match stack.last() {
                Some(&parent) => {
                    let id = push(&mut nodes, text_node(raw, event_line));
                    attach(&mut nodes, parent, id);
                }
                None if root.is_none() => prologue.push_str(raw),
                None => epilogue.push_str(raw),
            },
        }
    }

    let Some(root) = root else {
        return Err(XmlError::NoRootElement);
    };
    Ok(DocumentTree::from_parts(
        nodes,
        root,
        label.to_owned(),
        prologue,
        epilogue,
    ))
}

fn push(nodes: &mut Vec<Node>, node: Node) -> NodeId {
    let id = NodeId::from_index(nodes.len());
    nodes.push(node);
    id
}

fn attach(nodes: &mut [Node], parent: NodeId, child: NodeId) {
    if let NodeKind::Element(e) = &mut nodes[parent.index()].kind {
        e.children.push(child);
    }
    nodes[child.index()].parent = Some(parent);
}

fn text_node(raw: &str, line: u32) -> Node {
    let content = unescape(raw).map_or_else(|_| raw.to_owned(), |c| c.into_owned());
    Node {
        kind: NodeKind::Text(Text {
            raw: raw.to_owned(),
            content,
            ws_only: is_xml_whitespace(raw),
        }),
        parent: None,
        file: 0,
        line,
    }
}

fn comment_node(raw: &str, line: u32) -> Node {
    Node {
        kind: NodeKind::Comment(Comment {
            raw: raw.to_owned(),
        }),
        parent: None,
        file: 0,
        line,
    }
}

fn build_element(
    scanned: &ScannedTag,
    self_closing: bool,
    tag_line: u32,
    ns: &NamespaceStack,
) -> Result<Element, XmlError> {
    let mut attributes = Vec::with_capacity(scanned.attributes.len());
    for raw_attr in &scanned.attributes {
        let (prefix, local) = split_qname(&raw_attr.qname);
        let ns_uri = resolve_attr_ns(prefix.as_deref(), ns);
        let value = unescape(&raw_attr.raw_value)
            .map_err(|e| XmlError::Syntax {
                detail: format!("bad escape in attribute {}: {e}", raw_attr.qname),
                line: tag_line + raw_attr.newlines_before,
            })?
            .into_owned();
        attributes.push(Attribute {
            gap: raw_attr.gap.clone(),
            qname: raw_attr.qname.clone(),
            eq: raw_attr.eq.clone(),
            quote: raw_attr.quote,
            raw_value: raw_attr.raw_value.clone(),
            prefix,
            local,
            ns_uri,
            value,
            line: tag_line + raw_attr.newlines_before,
        });
    }
    Ok(Element {
        name: scanned.name.clone(),
        attributes,
        children: Vec::new(),
        tail_gap: scanned.tail_gap.clone(),
        self_closing,
        close: None,
    })
}

fn split_qname(qname: &str) -> (Option<String>, String) {
    match qname.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_owned()), local.to_owned()),
        None => (None, qname.to_owned()),
    }
}

fn resolve_attr_ns(prefix: Option<&str>, ns: &NamespaceStack) -> String {
    match prefix {
        // Unprefixed attributes are in no namespace.
        None => String::new(),
        Some("xmlns") => XMLNS_NS.to_owned(),
        // An unbound prefix keeps the prefix string as its pseudo-URI so two
        // distinct unbound prefixes never compare equal.
        Some(p) => ns.lookup(p).map_or_else(|| p.to_owned(), str::to_owned),
    }
}

// ---------------------------------------------------------------------------
// Namespace bindings
// ---------------------------------------------------------------------------

/// Live `xmlns:*` prefix bindings, one scope per open element.
struct NamespaceStack {
    scopes: Vec<Vec<(String, String)>>,
}

impl NamespaceStack {
    fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Opens a scope holding the bindings declared on `tag`. Declarations on
    /// a tag are visible to that tag's own attributes, so this runs before
    /// attribute resolution.
    fn push_scope(&mut self, tag: &ScannedTag) {
        let mut bindings = Vec::new();
        for attr in &tag.attributes {
            if let Some(declared) = attr.qname.strip_prefix("xmlns:") {
                let uri = unescape(&attr.raw_value)
                    .map_or_else(|_| attr.raw_value.clone(), |c| c.into_owned());
                bindings.push((declared.to_owned(), uri));
            }
        }
        self.scopes.push(bindings);
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }
}

// ---------------------------------------------------------------------------
// Start-tag scanning
// ---------------------------------------------------------------------------

/// Verbatim pieces of one start tag, recovered from its raw text.
struct ScannedTag {
    name: String,
    attributes: Vec<ScannedAttr>,
    tail_gap: String,
}

struct ScannedAttr {
    gap: String,
    qname: String,
    eq: String,
    quote: char,
    raw_value: String,
    newlines_before: u32,
}

/// Splits a raw start tag (`<name a="v" ...>` or `<name .../>`) into its
/// verbatim components. The tokenizer has already vouched for the basic
/// shape; this scan only needs to recover spans it does not expose.
fn scan_start_tag(raw: &str, self_closing: bool) -> Result<ScannedTag, String> {
    let trailer = if self_closing { 2 } else { 1 };
    if raw.len() < 1 + trailer || !raw.starts_with('<') {
        return Err(format!("malformed tag: {raw:?}"));
    }
    let inner = &raw[1..raw.len() - trailer];
    let bytes = inner.as_bytes();
    let mut i = 0usize;

    let name_start = i;
    while i < bytes.len() && !is_ws(bytes[i]) {
        i += 1;
    }
    let name = inner[name_start..i].to_owned();
    if name.is_empty() {
        return Err("tag has an empty name".to_owned());
    }

    let mut attributes = Vec::new();
    let tail_gap;
    loop {
        let gap_start = i;
        while i < bytes.len() && is_ws(bytes[i]) {
            i += 1;
        }
        if i >= bytes.len() {
            tail_gap = inner[gap_start..].to_owned();
            break;
        }
        let gap = inner[gap_start..i].to_owned();
        let newlines_before = count_newlines(&inner[..i]);

        let qname_start = i;
        while i < bytes.len() && !is_ws(bytes[i]) && bytes[i] != b'=' {
            i += 1;
        }
        let qname = inner[qname_start..i].to_owned();
        if qname.is_empty() {
            return Err(format!("malformed attribute in <{name}>"));
        }

        let eq_start = i;
        while i < bytes.len() && is_ws(bytes[i]) {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            return Err(format!("attribute {qname} in <{name}> has no value"));
        }
        i += 1;
        while i < bytes.len() && is_ws(bytes[i]) {
            i += 1;
        }
        let eq = inner[eq_start..i].to_owned();

        if i >= bytes.len() || (bytes[i] != b'"' && bytes[i] != b'\'') {
            return Err(format!("attribute {qname} in <{name}> has an unquoted value"));
        }
        let quote = bytes[i] as char;
        i += 1;
        let value_start = i;
        while i < bytes.len() && bytes[i] as char != quote {
            i += 1;
        }
        if i >= bytes.len() {
            return Err(format!("attribute {qname} in <{name}> has an unterminated value"));
        }
        let raw_value = inner[value_start..i].to_owned();
        i += 1;

        attributes.push(ScannedAttr {
            gap,
            qname,
            eq,
            quote,
            raw_value,
            newlines_before,
        });
    }

    Ok(ScannedTag {
        name,
        attributes,
        tail_gap,
    })
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn count_newlines(s: &str) -> u32 {
    s.bytes().filter(|&b| b == b'\n').count() as u32
}

fn line_of_offset(input: &str, offset: usize) -> u32 {
    let clamped = offset.min(input.len());
    1 + count_newlines(&input[..clamped])
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Serializes a tree back to text by concatenating the stored verbatim
/// pieces. Identity on anything `parse_document` produced and the engine did
/// not touch.
pub fn write_document(tree: &DocumentTree) -> String {
    let mut out = String::new();
    out.push_str(&tree.prologue);
    write_node(tree, tree.root(), &mut out);
    out.push_str(&tree.epilogue);
    out
}

fn write_node(tree: &DocumentTree, id: NodeId, out: &mut String) {
    match &tree.node(id).kind {
        NodeKind::Element(e) => {
            out.push('<');
            out.push_str(&e.name);
            for attr in &e.attributes {
                out.push_str(&attr.gap);
                out.push_str(&attr.qname);
                out.push_str(&attr.eq);
                out.push(attr.quote);
                out.push_str(&attr.raw_value);
                out.push(attr.quote);
            }
            out.push_str(&e.tail_gap);
            if e.self_closing {
                out.push_str("/>");
            } else {
                out.push('>');
                for &child in &e.children {
                    write_node(tree, child, out);
                }
                match &e.close {
                    Some(close) => out.push_str(close),
                    None => {
                        out.push_str("</");
                        out.push_str(&e.name);
                        out.push('>');
                    }
                }
            }
        }
        NodeKind::Comment(c) => out.push_str(&c.raw),
        NodeKind::Text(t) => out.push_str(&t.raw),
    }
}

/// Escapes a string for use as an attribute value. Used when the engine
/// rewrites a value and the raw span must be regenerated.
pub(crate) fn escape_attr_value(value: &str) -> String {
    escape(value).into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests;
