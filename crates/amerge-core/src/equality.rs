/// Semantic equality of element subtrees.
///
/// Two elements are semantically equal when their names match, their
/// attribute *sets* match (order-independent, compared by expanded name and
/// unescaped value), and their filtered child lists match pairwise in order.
/// The filter drops comments and whitespace-only text, so equality is
/// independent of source file, line numbers, attribute ordering, and
/// indentation — exactly the properties two build inputs should be allowed
/// to differ in while still being "the same element".
use crate::tree::{DocumentTree, Element, NodeId, NodeKind};

/// Compares two element subtrees, each in its own tree.
pub fn semantically_equal(
    a_tree: &DocumentTree,
    a: NodeId,
    b_tree: &DocumentTree,
    b: NodeId,
) -> bool {
    match (&a_tree.node(a).kind, &b_tree.node(b).kind) {
        (NodeKind::Element(ea), NodeKind::Element(eb)) => {
            ea.name == eb.name
                && attribute_sets_equal(ea, eb)
                && children_equal(a_tree, ea, b_tree, eb)
        }
        (NodeKind::Text(ta), NodeKind::Text(tb)) => ta.content == tb.content,
        // Comments never reach a comparison (they are filtered out), and a
        // kind mismatch is never equal.
        (
            NodeKind::Element(_) | NodeKind::Comment(_) | NodeKind::Text(_),
            NodeKind::Element(_) | NodeKind::Comment(_) | NodeKind::Text(_),
        ) => false,
    }
}

/// Unordered attribute-set comparison keyed on `(namespace, local name)`.
pub(crate) fn attribute_sets_equal(a: &Element, b: &Element) -> bool {
    if a.attributes.len() != b.attributes.len() {
        return false;
    }
    a.attributes.iter().all(|attr| {
        b.attribute(&attr.ns_uri, &attr.local)
            .is_some_and(|other| other.value == attr.value)
    })
}

/// The significant children of an element: everything except comments and
/// whitespace-only text, in document order.
pub(crate) fn significant_children(tree: &DocumentTree, element: &Element) -> Vec<NodeId> {
    element
        .children
        .iter()
        .copied()
        .filter(|&c| match &tree.node(c).kind {
            NodeKind::Element(_) => true,
            NodeKind::Comment(_) => false,
            NodeKind::Text(t) => !t.ws_only,
        })
        .collect()
}

fn children_equal(a_tree: &DocumentTree, ea: &Element, b_tree: &DocumentTree, eb: &Element) -> bool {
    let a_children = significant_children(a_tree, ea);
    let b_children = significant_children(b_tree, eb);
    a_children.len() == b_children.len()
        && a_children
            .iter()
            .zip(b_children.iter())
            .all(|(&ca, &cb)| semantically_equal(a_tree, ca, b_tree, cb))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
