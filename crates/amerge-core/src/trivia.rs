/// Leading-trivia capture for element migration.
///
/// When a library element is appended into the primary document it brings
/// its comment block along: the run of comment nodes and whitespace-only
/// text nodes immediately preceding it in the library source, ending at the
/// first different element, the parent's opening, or non-whitespace text.
/// The run is captured as a slice of sibling handles in document order and
/// re-created verbatim on the primary side, so a library's documentation
/// travels with the component it documents.
use crate::tree::{DocumentTree, NodeId, NodeKind};

/// Captures the leading trivia run of `node` within its parent, in document
/// order. Empty when the node has no parent or no preceding trivia.
pub fn leading_trivia(tree: &DocumentTree, node: NodeId) -> Vec<NodeId> {
    let Some(parent) = tree.node(node).parent else {
        return Vec::new();
    };
    let Some(parent_el) = tree.element(parent) else {
        return Vec::new();
    };
    let Some(position) = parent_el.children.iter().position(|&c| c == node) else {
        return Vec::new();
    };

    let mut run = Vec::new();
    for &sibling in parent_el.children[..position].iter().rev() {
        let keep = match &tree.node(sibling).kind {
            NodeKind::Comment(_) => true,
            NodeKind::Text(t) => t.ws_only,
            NodeKind::Element(_) => false,
        };
        if !keep {
            break;
        }
        run.push(sibling);
    }
    run.reverse();
    run
}

/// Derives one line of indentation for new children of `parent` from the
/// whitespace already inside it: the text after the last newline of the
/// final whitespace-only text node that precedes an element child. Falls
/// back to four spaces when the parent holds no such sample.
pub fn context_indent(tree: &DocumentTree, parent: NodeId) -> String {
    let Some(parent_el) = tree.element(parent) else {
        return "    ".to_owned();
    };
    let mut indent: Option<String> = None;
    let mut pending: Option<&str> = None;
    for &child in &parent_el.children {
        match &tree.node(child).kind {
            NodeKind::Text(t) if t.ws_only => pending = Some(&t.raw),
            NodeKind::Element(_) => {
                if let Some(ws) = pending.take() {
                    if let Some(after_newline) = ws.rsplit('\n').next() {
                        if !after_newline.is_empty() || ws.contains('\n') {
                            indent = Some(after_newline.to_owned());
                        }
                    }
                }
            }
            NodeKind::Comment(_) | NodeKind::Text(_) => {}
        }
    }
    indent.unwrap_or_else(|| "    ".to_owned())
}

/// Whether a captured trivia run ends with whitespace that puts the next
/// node on its own indented line. When it does not, the engine synthesizes
/// the indentation itself.
pub fn supplies_own_indent(tree: &DocumentTree, run: &[NodeId]) -> bool {
    run.last().is_some_and(|&id| match &tree.node(id).kind {
        NodeKind::Text(t) => t.ws_only && t.raw.contains('\n'),
        NodeKind::Comment(_) | NodeKind::Element(_) => false,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::xml::parse_document;

    fn parse(input: &str) -> DocumentTree {
        parse_document(input, "lib1.xml").expect("valid test document")
    }

    fn app_child(tree: &DocumentTree, tag: &str) -> NodeId {
        let app = tree
            .find_child_element(tree.root(), "application")
            .expect("application");
        tree.find_child_element(app, tag).expect("requested child")
    }

    #[test]
    fn captures_comment_block_with_interleaved_whitespace() {
        let tree = parse(
            "<manifest><application>\n    <!-- one -->\n    <!-- two -->\n    <activity/>\n</application></manifest>",
        );
        let activity = app_child(&tree, "activity");
        let run = leading_trivia(&tree, activity);
        // ws, comment, ws, comment, ws
        assert_eq!(run.len(), 5);
        let rendered: String = run
            .iter()
            .map(|&id| match &tree.node(id).kind {
                NodeKind::Comment(c) => c.raw.clone(),
                NodeKind::Text(t) => t.raw.clone(),
                NodeKind::Element(_) => String::new(),
            })
            .collect();
        assert_eq!(rendered, "\n    <!-- one -->\n    <!-- two -->\n    ");
    }

    #[test]
    fn capture_stops_at_previous_element() {
        let tree = parse(
            "<manifest><application><service/>\n    <!-- doc -->\n    <activity/></application></manifest>",
        );
        let activity = app_child(&tree, "activity");
        let run = leading_trivia(&tree, activity);
        assert_eq!(run.len(), 3);
        assert!(run.iter().all(|&id| {
            !matches!(tree.node(id).kind, NodeKind::Element(_))
        }));
    }

    #[test]
    fn capture_stops_at_non_whitespace_text() {
        let tree = parse("<manifest><application>stray text <activity/></application></manifest>");
        let activity = app_child(&tree, "activity");
        assert!(leading_trivia(&tree, activity).is_empty());
    }

    #[test]
    fn first_child_captures_up_to_parent_opening() {
        let tree = parse("<manifest><application>\n  <activity/></application></manifest>");
        let activity = app_child(&tree, "activity");
        assert_eq!(leading_trivia(&tree, activity).len(), 1);
    }

    #[test]
    fn root_has_no_trivia() {
        let tree = parse("<manifest/>");
        assert!(leading_trivia(&tree, tree.root()).is_empty());
    }

    // -- indentation ---------------------------------------------------------

    #[test]
    fn context_indent_matches_existing_children() {
        let tree = parse("<manifest>\n        <application/>\n</manifest>");
        assert_eq!(context_indent(&tree, tree.root()), "        ");
    }

    #[test]
    fn context_indent_defaults_without_samples() {
        let tree = parse("<manifest><application/></manifest>");
        assert_eq!(context_indent(&tree, tree.root()), "    ");
    }

    #[test]
    fn own_indent_detection() {
        let tree = parse(
            "<manifest><application>\n    <!-- c -->\n    <activity/> <service/></application></manifest>",
        );
        let activity = app_child(&tree, "activity");
        let run = leading_trivia(&tree, activity);
        assert!(supplies_own_indent(&tree, &run));

        let service = app_child(&tree, "service");
        let run = leading_trivia(&tree, service);
        // A single space carries no newline: the next element is not on its
        // own line.
        assert!(!supplies_own_indent(&tree, &run));
    }
}
