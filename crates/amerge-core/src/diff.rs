/// The attribute/child diff block for incompatible-element diagnostics.
///
/// When two keyed elements collide and are not semantically equal, the
/// engine's error carries a minimal, fully deterministic diff:
///
/// ```text
///   <activity android:name=com.example.LibActivity>
///       @android:icon = @drawable/lib_icon
///       @android:label = @string/lib_activity_name
///       @android:name = com.example.LibActivity
/// --    @android:theme = @style/Lib.Theme
/// ```
///
/// Attribute lines list the union of both sides sorted by local name; `--`
/// carries the library side of a difference and `++` the primary side, with
/// unmarked lines for attributes the two sides agree on. Child lines report
/// only the *first* point where the filtered child lists diverge, descending
/// depth-first through pairs that agree on the surface; `(end reached)`
/// stands in for an exhausted list. Indentation grows two columns per
/// nesting level.
use std::collections::BTreeMap;

use crate::equality::{attribute_sets_equal, semantically_equal, significant_children};
use crate::kinds::ANDROID_NS;
use crate::tree::{Attribute, DocumentTree, NodeId, NodeKind};

/// Builds the diff block for a colliding, unequal element pair. The returned
/// lines carry their own indentation and no trailing newlines; the engine
/// joins them under the diagnostic's header line.
pub fn element_diff(
    primary_tree: &DocumentTree,
    primary: NodeId,
    library_tree: &DocumentTree,
    library: NodeId,
) -> Vec<String> {
    let mut lines = Vec::new();
    let Some(p_el) = primary_tree.element(primary) else {
        return lines;
    };
    let Some(l_el) = library_tree.element(library) else {
        return lines;
    };

    lines.push(header_line(primary_tree, primary));

    // -- attribute section ---------------------------------------------------
    // Union of both sides keyed by (local, namespace), sorted by local name.
    let mut union: BTreeMap<(String, String), (Option<&Attribute>, Option<&Attribute>)> =
        BTreeMap::new();
    for attr in &p_el.attributes {
        union
            .entry((attr.local.clone(), attr.ns_uri.clone()))
            .or_insert((None, None))
            .0 = Some(attr);
    }
    for attr in &l_el.attributes {
        union
            .entry((attr.local.clone(), attr.ns_uri.clone()))
            .or_insert((None, None))
            .1 = Some(attr);
    }

    for (p_attr, l_attr) in union.values() {
        match (p_attr, l_attr) {
            (Some(p), Some(l)) if p.value == l.value => {
                lines.push(format!("      @{} = {}", p.qname, p.value));
            }
            (Some(p), Some(l)) => {
                lines.push(format!("--    @{} = {}", l.qname, l.value));
                lines.push(format!("++    @{} = {}", p.qname, p.value));
            }
            (None, Some(l)) => {
                lines.push(format!("--    @{} = {}", l.qname, l.value));
            }
            (Some(p), None) => {
                lines.push(format!("++    @{} = {}", p.qname, p.value));
            }
            (None, None) => {}
        }
    }

    // -- child section -------------------------------------------------------
    diff_children(primary_tree, primary, library_tree, library, 1, &mut lines);

    lines
}

/// Reports the first divergence between the filtered child lists of two
/// elements, recursing into pairs whose surface agrees. Returns `true` when
/// a divergence was emitted.
fn diff_children(
    primary_tree: &DocumentTree,
    primary: NodeId,
    library_tree: &DocumentTree,
    library: NodeId,
    depth: usize,
    lines: &mut Vec<String>,
) -> bool {
    let p_kids = primary_tree
        .element(primary)
        .map(|e| significant_children(primary_tree, e))
        .unwrap_or_default();
    let l_kids = library_tree
        .element(library)
        .map(|e| significant_children(library_tree, e))
        .unwrap_or_default();

    let indent = "  ".repeat(depth);
    let count = p_kids.len().max(l_kids.len());
    for i in 0..count {
        match (p_kids.get(i), l_kids.get(i)) {
            (Some(&p), Some(&l)) => {
                if shallow_equal(primary_tree, p, library_tree, l) {
                    if semantically_equal(primary_tree, p, library_tree, l) {
                        continue;
                    }
                    // Same surface, different substructure: descend.
                    if diff_children(primary_tree, p, library_tree, l, depth + 1, lines) {
                        return true;
                    }
                    continue;
                }
                lines.push(format!("--{indent}{}", render_node(library_tree, l)));
                lines.push(format!("++{indent}{}", render_node(primary_tree, p)));
                return true;
            }
            (None, Some(&l)) => {
                lines.push(format!("--{indent}{}", render_node(library_tree, l)));
                lines.push(format!("++{indent}(end reached)"));
                return true;
            }
            (Some(&p), None) => {
                lines.push(format!("--{indent}(end reached)"));
                lines.push(format!("++{indent}{}", render_node(primary_tree, p)));
                return true;
            }
            (None, None) => {}
        }
    }
    false
}

/// Whether two nodes agree on the surface: same tag and attribute set for
/// elements, same content for text. Children are not considered.
fn shallow_equal(a_tree: &DocumentTree, a: NodeId, b_tree: &DocumentTree, b: NodeId) -> bool {
    match (&a_tree.node(a).kind, &b_tree.node(b).kind) {
        (NodeKind::Element(ea), NodeKind::Element(eb)) => {
            ea.name == eb.name && attribute_sets_equal(ea, eb)
        }
        (NodeKind::Text(ta), NodeKind::Text(tb)) => ta.content == tb.content,
        (
            NodeKind::Element(_) | NodeKind::Comment(_) | NodeKind::Text(_),
            NodeKind::Element(_) | NodeKind::Comment(_) | NodeKind::Text(_),
        ) => false,
    }
}

fn header_line(tree: &DocumentTree, element: NodeId) -> String {
    let Some(el) = tree.element(element) else {
        return String::new();
    };
    match el.attribute(ANDROID_NS, "name") {
        Some(name) => format!("  <{} {}={}>", el.name, name.qname, name.value),
        None => format!("  <{}>", el.name),
    }
}

fn render_node(tree: &DocumentTree, id: NodeId) -> String {
    match &tree.node(id).kind {
        NodeKind::Element(e) => match e.attribute(ANDROID_NS, "name") {
            Some(name) => format!("<{} {}={}>", e.name, name.qname, name.value),
            None => format!("<{}>", e.name),
        },
        NodeKind::Text(t) => format!("\"{}\"", t.content),
        NodeKind::Comment(_) => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::xml::parse_document;

    const XMLNS: &str = "xmlns:android=\"http://schemas.android.com/apk/res/android\"";

    fn first_app_child(input: &str, label: &str) -> (DocumentTree, NodeId) {
        let tree = parse_document(input, label).expect("valid test document");
        let app = tree
            .find_child_element(tree.root(), "application")
            .expect("application");
        let child = tree.child_elements(app).next().expect("one element child");
        (tree, child)
    }

    fn wrap(inner: &str) -> String {
        format!("<manifest {XMLNS}><application>{inner}</application></manifest>")
    }

    fn diff(primary_inner: &str, library_inner: &str) -> Vec<String> {
        let (pt, pn) = first_app_child(&wrap(primary_inner), "main.xml");
        let (lt, ln) = first_app_child(&wrap(library_inner), "lib1.xml");
        element_diff(&pt, pn, &lt, ln)
    }

    // -- attribute layout ----------------------------------------------------

    #[test]
    fn library_only_attribute_listing() {
        // Primary has icon/label/name; library adds a theme.
        let lines = diff(
            "<activity android:icon=\"@drawable/lib_icon\" android:label=\"@string/lib_activity_name\" android:name=\"com.example.LibActivity\"/>",
            "<activity android:icon=\"@drawable/lib_icon\" android:label=\"@string/lib_activity_name\" android:name=\"com.example.LibActivity\" android:theme=\"@style/Lib.Theme\"/>",
        );
        assert_eq!(
            lines,
            vec![
                "  <activity android:name=com.example.LibActivity>".to_owned(),
                "      @android:icon = @drawable/lib_icon".to_owned(),
                "      @android:label = @string/lib_activity_name".to_owned(),
                "      @android:name = com.example.LibActivity".to_owned(),
                "--    @android:theme = @style/Lib.Theme".to_owned(),
            ]
        );
    }

    #[test]
    fn differing_attribute_shows_both_sides() {
        let lines = diff(
            "<activity android:name=\"A\" android:screenOrientation=\"portrait\"/>",
            "<activity android:name=\"A\" android:screenOrientation=\"landscape\"/>",
        );
        assert_eq!(
            lines,
            vec![
                "  <activity android:name=A>".to_owned(),
                "      @android:name = A".to_owned(),
                "--    @android:screenOrientation = landscape".to_owned(),
                "++    @android:screenOrientation = portrait".to_owned(),
            ]
        );
    }

    #[test]
    fn primary_only_attribute_is_marked_with_plus() {
        let lines = diff(
            "<activity android:name=\"A\" android:theme=\"T\"/>",
            "<activity android:name=\"A\"/>",
        );
        assert!(lines.contains(&"++    @android:theme = T".to_owned()));
        assert!(!lines.iter().any(|l| l.starts_with("--")));
    }

    #[test]
    fn attributes_sort_by_local_name() {
        let lines = diff(
            "<activity android:zz=\"1\" android:aa=\"2\" android:name=\"A\"/>",
            "<activity android:name=\"A\"/>",
        );
        let positions: Vec<usize> = ["aa", "name", "zz"]
            .iter()
            .map(|n| {
                lines
                    .iter()
                    .position(|l| l.contains(&format!("@android:{n}")))
                    .expect("attribute line present")
            })
            .collect();
        assert!(positions[0] < positions[1] && positions[1] < positions[2]);
    }

    // -- child divergence ---------------------------------------------------

    #[test]
    fn extra_library_child_against_empty_primary() {
        let lines = diff(
            "<service android:name=\"com.example.AppService2\"/>",
            "<service android:name=\"com.example.AppService2\"><intent-filter/></service>",
        );
        assert_eq!(
            lines,
            vec![
                "  <service android:name=com.example.AppService2>".to_owned(),
                "      @android:name = com.example.AppService2".to_owned(),
                "--  <intent-filter>".to_owned(),
                "++  (end reached)".to_owned(),
            ]
        );
    }

    #[test]
    fn extra_primary_child_is_the_mirror_image() {
        let lines = diff(
            "<service android:name=\"S\"><intent-filter/></service>",
            "<service android:name=\"S\"/>",
        );
        assert_eq!(
            lines[lines.len() - 2..],
            [
                "--  (end reached)".to_owned(),
                "++  <intent-filter>".to_owned(),
            ]
        );
    }

    #[test]
    fn divergence_nested_one_level_indents_deeper() {
        let lines = diff(
            "<activity android:name=\"A\"><intent-filter><action android:name=\"MAIN\"/></intent-filter></activity>",
            "<activity android:name=\"A\"><intent-filter><action android:name=\"VIEW\"/></intent-filter></activity>",
        );
        assert_eq!(
            lines[lines.len() - 2..],
            [
                "--    <action android:name=VIEW>".to_owned(),
                "++    <action android:name=MAIN>".to_owned(),
            ]
        );
    }

    #[test]
    fn diff_stops_at_first_divergence() {
        // Two divergent slots; only the first is reported.
        let lines = diff(
            "<service android:name=\"S\"><a/><b/></service>",
            "<service android:name=\"S\"><x/><y/></service>",
        );
        let markers = lines.iter().filter(|l| l.starts_with("--")).count();
        assert_eq!(markers, 1);
        assert!(lines.contains(&"--  <x>".to_owned()));
        assert!(!lines.iter().any(|l| l.contains("<y>")));
    }

    #[test]
    fn equal_elements_produce_header_and_plain_attributes_only() {
        let lines = diff(
            "<activity android:name=\"A\"/>",
            "<activity android:name=\"A\"/>",
        );
        assert_eq!(
            lines,
            vec![
                "  <activity android:name=A>".to_owned(),
                "      @android:name = A".to_owned(),
            ]
        );
    }

    #[test]
    fn text_children_render_quoted() {
        let lines = diff(
            "<meta-data android:name=\"M\">one</meta-data>",
            "<meta-data android:name=\"M\">two</meta-data>",
        );
        assert_eq!(
            lines[lines.len() - 2..],
            ["--  \"two\"".to_owned(), "++  \"one\"".to_owned()]
        );
    }
}
