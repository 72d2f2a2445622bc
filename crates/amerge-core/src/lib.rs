#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod diff;
pub mod equality;
pub mod kinds;
pub mod merge;
pub mod newtypes;
pub mod paths;
pub mod report;
pub mod tree;
pub mod trivia;
pub mod xml;

pub use diff::element_diff;
pub use equality::semantically_equal;
pub use kinds::{ANDROID_NS, ElementKind, Level, MergeAction};
pub use merge::merge;
pub use newtypes::{GlEsVersion, RequiredFlag, SdkVersion, ValueError};
pub use paths::{ElementPath, PathSegment};
pub use report::{Diagnostic, FileRef, MergeReport, Severity};
pub use tree::{Attribute, Comment, DocumentTree, Element, Node, NodeId, NodeKind, Text};
pub use trivia::{context_indent, leading_trivia};
pub use xml::{XMLNS_NS, XmlError, parse_document, write_document};

/// Returns the current version of the amerge-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn version_is_semver() {
        let v = version();
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "version should have 3 parts: {v}");
        for part in parts {
            part.parse::<u32>().expect("each part should be a number");
        }
    }
}
