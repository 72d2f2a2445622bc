/// Arena document model for Android manifest trees.
///
/// A [`DocumentTree`] owns every node of one parsed manifest in a flat
/// `Vec<Node>`; a [`NodeId`] is a copyable index into that arena. Parent
/// links are plain indices, so subtrees can be walked in both directions
/// without ownership cycles and a diagnostic can hold a node handle cheaply.
///
/// Formatting fidelity is the point of this model: every piece of inter-tag
/// text (indentation, blank lines, comments) is an explicit [`Text`] or
/// [`Comment`] child node carrying its verbatim source text, and every
/// [`Attribute`] records the exact whitespace, quote character, and escaped
/// value span it was written with. Serializing an untouched tree reproduces
/// the input byte for byte; the only mutation the merge engine performs on
/// existing content — rewriting an attribute value — replaces nothing but
/// the text between the quotes.
use crate::xml::escape_attr_value;

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Handle to a node inside a [`DocumentTree`] arena.
///
/// Only meaningful for the tree that produced it. Handles are never
/// invalidated: the engine appends nodes but never removes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Builds a handle from a raw arena index. Reader-internal; the index
    /// must refer to a node of the tree under construction.
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

// ---------------------------------------------------------------------------
// Attribute
// ---------------------------------------------------------------------------

/// One attribute of an [`Element`], with enough verbatim detail to write it
/// back exactly as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Whitespace between the previous attribute (or the tag name) and this
    /// attribute, verbatim.
    pub gap: String,
    /// The qualified name exactly as written, e.g. `android:name`.
    pub qname: String,
    /// The text between the name and the opening quote — usually `=`, but
    /// XML permits whitespace around it.
    pub eq: String,
    /// The quote character used in the source: `"` or `'`.
    pub quote: char,
    /// The escaped value text exactly as written between the quotes.
    pub raw_value: String,
    /// The namespace prefix, if the name was prefixed.
    pub prefix: Option<String>,
    /// The local part of the name.
    pub local: String,
    /// The resolved namespace URI. Empty for unprefixed attributes; for a
    /// prefix with no in-scope binding the prefix string itself is used so
    /// distinct unknown prefixes do not collapse together.
    pub ns_uri: String,
    /// The unescaped value.
    pub value: String,
    /// Source line of the attribute name (1-based).
    pub line: u32,
}

impl Attribute {
    /// Returns `true` when this attribute's expanded name matches the given
    /// namespace URI and local name.
    pub fn is(&self, ns_uri: &str, local: &str) -> bool {
        self.ns_uri == ns_uri && self.local == local
    }
}

// ---------------------------------------------------------------------------
// Element, Comment, Text
// ---------------------------------------------------------------------------

/// An element node: qualified name, ordered attributes, ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name exactly as written (manifest tags are conventionally
    /// unprefixed, e.g. `activity`).
    pub name: String,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    /// Child nodes in source order, including comments and text.
    pub children: Vec<NodeId>,
    /// Whitespace between the last attribute and the closing `>` or `/>`.
    pub tail_gap: String,
    /// `true` for `<tag/>` forms.
    pub self_closing: bool,
    /// The verbatim end tag (e.g. `</activity>`); `None` when self-closing.
    pub close: Option<String>,
}

impl Element {
    /// Looks up an attribute by expanded name.
    pub fn attribute(&self, ns_uri: &str, local: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.is(ns_uri, local))
    }

    /// Looks up an attribute value by expanded name.
    pub fn attribute_value(&self, ns_uri: &str, local: &str) -> Option<&str> {
        self.attribute(ns_uri, local).map(|a| a.value.as_str())
    }
}

/// A comment node, stored verbatim including the `<!--`/`-->` delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// The full comment text as written.
    pub raw: String,
}

impl Comment {
    /// Returns the text between the comment delimiters.
    pub fn content(&self) -> &str {
        self.raw
            .strip_prefix("<!--")
            .and_then(|s| s.strip_suffix("-->"))
            .unwrap_or(&self.raw)
    }
}

/// A character-data node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    /// The text exactly as written, entities unexpanded.
    pub raw: String,
    /// The unescaped content, used for semantic comparison.
    pub content: String,
    /// Whether the content is entirely XML whitespace. Computed once at
    /// parse time; the trivia pass and the equality filter both test it.
    pub ws_only: bool,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// The payload of a [`Node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element and its subtree.
    Element(Element),
    /// A comment.
    Comment(Comment),
    /// Character data (including whitespace runs between elements).
    Text(Text),
}

/// One node of a [`DocumentTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// What the node is.
    pub kind: NodeKind,
    /// Parent element, `None` for the root (or for a node not yet inserted).
    pub parent: Option<NodeId>,
    /// Index into [`DocumentTree::files`] identifying the source file.
    pub file: usize,
    /// Source line (1-based) where the node starts.
    pub line: u32,
}

// ---------------------------------------------------------------------------
// DocumentTree
// ---------------------------------------------------------------------------

/// A parsed manifest document.
///
/// The first entry of `files` is the document's own label; when subtrees are
/// migrated in from another tree during a merge, the source tree's labels are
/// appended so every node keeps its provenance.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<Node>,
    root: NodeId,
    /// Labels of every file that contributed nodes to this tree.
    pub files: Vec<String>,
    /// Verbatim content before the root element (XML declaration, doctype,
    /// leading comments and whitespace).
    pub prologue: String,
    /// Verbatim content after the root element's end tag.
    pub epilogue: String,
}

impl DocumentTree {
    /// Assembles a tree from parts. Used by the XML reader; the arena must
    /// already be internally consistent (`root` and all child/parent links
    /// valid indices into `nodes`).
    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        root: NodeId,
        label: String,
        prologue: String,
        epilogue: String,
    ) -> Self {
        Self {
            nodes,
            root,
            files: vec![label],
            prologue,
            epilogue,
        }
    }

    /// The root element's handle.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The label this document was parsed from (`files[0]`).
    pub fn label(&self) -> &str {
        &self.files[0]
    }

    /// Borrows a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Borrows a node's element payload, or `None` for comment/text nodes.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id).kind {
            NodeKind::Element(e) => Some(e),
            NodeKind::Comment(_) | NodeKind::Text(_) => None,
        }
    }

    /// The source-file label for a node.
    pub fn file_label(&self, id: NodeId) -> &str {
        &self.files[self.node(id).file]
    }

    /// Iterates the element children of `parent` in document order.
    pub fn child_elements(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let children: &[NodeId] = match &self.node(parent).kind {
            NodeKind::Element(e) => &e.children,
            NodeKind::Comment(_) | NodeKind::Text(_) => &[],
        };
        children
            .iter()
            .copied()
            .filter(move |&c| matches!(self.node(c).kind, NodeKind::Element(_)))
    }

    /// Finds the first element child of `parent` with the given tag name.
    pub fn find_child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.child_elements(parent)
            .find(|&c| self.element(c).is_some_and(|e| e.name == tag))
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty. Never true for a parsed document.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -- mutation (merge engine only) ---------------------------------------

    /// Adds a detached node to the arena and returns its handle.
    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Inserts `child` into `parent`'s child list at `index`, fixing up the
    /// parent link. `index` may equal the current child count to append.
    pub(crate) fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let NodeKind::Element(e) = &mut self.nodes[parent.index()].kind {
            e.children.insert(index, child);
        }
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Overwrites the value of an attribute, re-escaping the raw span while
    /// leaving the attribute's surrounding formatting untouched. Returns
    /// `false` when the element has no such attribute.
    pub(crate) fn set_attribute_value(
        &mut self,
        element: NodeId,
        ns_uri: &str,
        local: &str,
        value: &str,
    ) -> bool {
        let NodeKind::Element(e) = &mut self.nodes[element.index()].kind else {
            return false;
        };
        let Some(attr) = e.attributes.iter_mut().find(|a| a.is(ns_uri, local)) else {
            return false;
        };
        attr.value = value.to_owned();
        attr.raw_value = escape_attr_value(value);
        true
    }

    /// Removes an attribute from an element. Returns `false` when absent.
    pub(crate) fn remove_attribute(&mut self, element: NodeId, ns_uri: &str, local: &str) -> bool {
        let NodeKind::Element(e) = &mut self.nodes[element.index()].kind else {
            return false;
        };
        let Some(pos) = e.attributes.iter().position(|a| a.is(ns_uri, local)) else {
            return false;
        };
        e.attributes.remove(pos);
        true
    }

    /// Creates a detached whitespace/text node attributed to this tree's own
    /// file label.
    pub(crate) fn new_text(&mut self, raw: &str, line: u32) -> NodeId {
        let ws_only = is_xml_whitespace(raw);
        self.push_node(Node {
            kind: NodeKind::Text(Text {
                raw: raw.to_owned(),
                content: raw.to_owned(),
                ws_only,
            }),
            parent: None,
            file: 0,
            line,
        })
    }

    /// Creates a detached comment node attributed to this tree's own label.
    pub(crate) fn new_comment(&mut self, raw: &str, line: u32) -> NodeId {
        self.push_node(Node {
            kind: NodeKind::Comment(Comment {
                raw: raw.to_owned(),
            }),
            parent: None,
            file: 0,
            line,
        })
    }

    /// Deep-copies a subtree from another (read-only) tree into this arena,
    /// remapping file indices so provenance survives the move. The copy is
    /// detached; insert it with [`DocumentTree::insert_child`].
    pub(crate) fn import_subtree(&mut self, src: &DocumentTree, src_node: NodeId) -> NodeId {
        let mut file_map: Vec<Option<usize>> = vec![None; src.files.len()];
        self.import_rec(src, src_node, &mut file_map)
    }

    fn import_rec(
        &mut self,
        src: &DocumentTree,
        src_node: NodeId,
        file_map: &mut Vec<Option<usize>>,
    ) -> NodeId {
        let node = src.node(src_node);
        let file = self.map_file(src, node.file, file_map);
        let (kind, child_ids) = match &node.kind {
            NodeKind::Element(e) => {
                let children: Vec<NodeId> = e
                    .children
                    .iter()
                    .map(|&c| self.import_rec(src, c, file_map))
                    .collect();
                let mut copy = e.clone();
                copy.children = children.clone();
                (NodeKind::Element(copy), children)
            }
            NodeKind::Comment(c) => (NodeKind::Comment(c.clone()), Vec::new()),
            NodeKind::Text(t) => (NodeKind::Text(t.clone()), Vec::new()),
        };
        let id = self.push_node(Node {
            kind,
            parent: None,
            file,
            line: node.line,
        });
        for c in child_ids {
            self.nodes[c.index()].parent = Some(id);
        }
        id
    }

    fn map_file(
        &mut self,
        src: &DocumentTree,
        src_file: usize,
        file_map: &mut [Option<usize>],
    ) -> usize {
        if let Some(mapped) = file_map[src_file] {
            return mapped;
        }
        let label = &src.files[src_file];
        let idx = match self.files.iter().position(|f| f == label) {
            Some(existing) => existing,
            None => {
                self.files.push(label.clone());
                self.files.len() - 1
            }
        };
        file_map[src_file] = Some(idx);
        idx
    }
}

/// Returns `true` when every character of `s` is XML whitespace.
///
/// An empty string counts as whitespace; empty text nodes only arise
/// synthetically and behave like trivia.
pub fn is_xml_whitespace(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
