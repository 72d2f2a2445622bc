//! Implementation of `amerge inspect <FILE>`.
//!
//! Parses a manifest and prints a component summary: the package name and a
//! count per recognized element kind. Doubles as a quick round-trip sanity
//! check for the codec — a manifest that inspects cleanly will merge.
use std::io::Write as _;
use std::path::Path;

use amerge_core::{DocumentTree, ElementKind, Level, parse_document};

use crate::error::CliError;
use crate::io::{label, read_manifest};

/// Runs the `inspect` command.
///
/// # Errors
///
/// Input failures only; inspection itself cannot fail.
pub fn run(file: &Path, max_file_size: u64) -> Result<(), CliError> {
    let text = read_manifest(file, max_file_size)?;
    let tree = parse_document(&text, &label(file)).map_err(|e| CliError::XmlSyntax {
        path: file.to_path_buf(),
        detail: e.to_string(),
    })?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let sink_error = |e: std::io::Error| CliError::IoError {
        source: "stdout".to_owned(),
        detail: e.to_string(),
    };

    let package = tree
        .element(tree.root())
        .and_then(|e| e.attribute_value("", "package"))
        .unwrap_or("(none)");
    writeln!(out, "package: {package}").map_err(sink_error)?;

    for (kind, count) in kind_counts(&tree) {
        writeln!(out, "{}: {count}", kind.tag()).map_err(sink_error)?;
    }
    Ok(())
}

/// Counts recognized elements at both levels, in a fixed display order.
fn kind_counts(tree: &DocumentTree) -> Vec<(ElementKind, usize)> {
    let mut counts: Vec<(ElementKind, usize)> = [
        ElementKind::UsesSdk,
        ElementKind::UsesPermission,
        ElementKind::UsesFeature,
        ElementKind::Activity,
        ElementKind::ActivityAlias,
        ElementKind::Service,
        ElementKind::Receiver,
        ElementKind::Provider,
        ElementKind::UsesLibrary,
        ElementKind::MetaData,
    ]
    .into_iter()
    .map(|k| (k, 0))
    .collect();

    let root = tree.root();
    let mut bump = |kind: ElementKind| {
        if let Some(entry) = counts.iter_mut().find(|(k, _)| *k == kind) {
            entry.1 += 1;
        }
    };
    for child in tree.child_elements(root) {
        if let Some(el) = tree.element(child) {
            if let Some(kind) = ElementKind::from_tag(&el.name, Level::Manifest) {
                bump(kind);
            }
        }
    }
    if let Some(app) = tree.find_child_element(root, "application") {
        for child in tree.child_elements(app) {
            if let Some(el) = tree.element(child) {
                if let Some(kind) = ElementKind::from_tag(&el.name, Level::Application) {
                    bump(kind);
                }
            }
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
