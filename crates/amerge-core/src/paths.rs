/// Canonical element paths for diagnostics.
///
/// Every keyed diagnostic names its element by a path like
/// `/manifest/application/activity[@name=com.example.X]`. The key segment is
/// the element's `android:name` attribute when present — the key attribute
/// of every keyed kind the engine merges.
use std::fmt;

use crate::kinds::ANDROID_NS;
use crate::tree::{DocumentTree, NodeId};

// ---------------------------------------------------------------------------
// ElementPath
// ---------------------------------------------------------------------------

/// One segment of an [`ElementPath`]: a tag name and an optional key value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// The element's tag name.
    pub tag: String,
    /// The element's `android:name` value, when declared.
    pub key: Option<String>,
}

/// The path of an element from the document root, rendered in the stable
/// textual form used by every diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath(Vec<PathSegment>);

impl ElementPath {
    /// Computes the path of `node` by walking parent links to the root.
    ///
    /// Non-element nodes contribute no segment; calling this on a comment or
    /// text node yields the path of its nearest element ancestor.
    pub fn of(tree: &DocumentTree, node: NodeId) -> Self {
        let mut segments = Vec::new();
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if let Some(element) = tree.element(id) {
                segments.push(PathSegment {
                    tag: element.name.clone(),
                    key: element
                        .attribute_value(ANDROID_NS, "name")
                        .map(str::to_owned),
                });
            }
            cursor = tree.node(id).parent;
        }
        segments.reverse();
        Self(segments)
    }

    /// The path segments, root first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", segment.tag)?;
            if let Some(key) = &segment.key {
                write!(f, "[@name={key}]")?;
            }
        }
        Ok(())
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

    fn parse(input: &str) -> DocumentTree {
        parse_document(input, "test.xml").expect("valid test document")
    }

    #[test]
    fn root_path() {
        let tree = parse("<manifest/>");
        let path = ElementPath::of(&tree, tree.root());
        assert_eq!(path.to_string(), "/manifest");
    }

    #[test]
    fn keyed_leaf_path() {
        let tree = parse(
            "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\">\
             <application><activity android:name=\"com.example.LibActivity\"/>\
             </application></manifest>",
        );
        let app = tree
            .find_child_element(tree.root(), "application")
            .expect("application");
        let activity = tree.find_child_element(app, "activity").expect("activity");
        assert_eq!(
            ElementPath::of(&tree, activity).to_string(),
            "/manifest/application/activity[@name=com.example.LibActivity]"
        );
    }

    #[test]
    fn unkeyed_intermediate_segments_have_no_selector() {
        let tree = parse(
            "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\">\
             <application><service android:name=\"S\"><intent-filter/></service>\
             </application></manifest>",
        );
        let app = tree
            .find_child_element(tree.root(), "application")
            .expect("application");
        let service = tree.find_child_element(app, "service").expect("service");
        let filter = tree
            .find_child_element(service, "intent-filter")
            .expect("intent-filter");
        assert_eq!(
            ElementPath::of(&tree, filter).to_string(),
            "/manifest/application/service[@name=S]/intent-filter"
        );
    }

    #[test]
    fn segments_are_root_first() {
        let tree = parse("<manifest><application/></manifest>");
        let app = tree
            .find_child_element(tree.root(), "application")
            .expect("application");
        let path = ElementPath::of(&tree, app);
        let tags: Vec<&str> = path.segments().iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, ["manifest", "application"]);
    }
}
