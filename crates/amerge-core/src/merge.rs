/// The manifest merge engine.
///
/// [`merge`] folds the recognized children of each library manifest into the
/// primary document, in library input order, and records every observable
/// outcome as a diagnostic. The pass structure per library:
///
/// 1. Root check — a library whose root is not `manifest` is reported and
///    skipped whole.
/// 2. Top-level pass over the library's `/manifest` children: `uses-sdk`
///    level reconciliation, `uses-feature` GL ES comparison and name union,
///    `uses-permission` union. Unrecognized kinds are ignored.
/// 3. Application pass over `/manifest/application` children: the keyed
///    structural kinds demand semantic equality on collision; `uses-library`
///    escalates its `required` flag; new keys queue for appending.
/// 4. Append phase: queued elements migrate into the primary with their
///    leading comment blocks, grouped into the fixed kind buckets, behind a
///    once-per-library source marker comment.
///
/// The primary document is mutated in place; library trees are read-only.
/// The engine touches nothing in the primary beyond appending children and
/// rewriting `uses-library/@required` values, so the primary's formatting
/// survives a merge byte for byte.
use crate::diff::element_diff;
use crate::equality::semantically_equal;
use crate::kinds::{ANDROID_NS, ElementKind, Level, MergeAction};
use crate::newtypes::{GlEsVersion, RequiredFlag, SdkVersion};
use crate::paths::ElementPath;
use crate::report::{FileRef, MergeReport};
use crate::tree::{DocumentTree, NodeId, NodeKind};
use crate::trivia::{context_indent, leading_trivia, supplies_own_indent};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Merges `libraries` into `primary`, in order, returning the diagnostic
/// report. Overall success is [`MergeReport::is_success`]: no error recorded.
///
/// With an empty library list this is the identity: the primary is untouched
/// and the report is empty.
pub fn merge(primary: &mut DocumentTree, libraries: &[DocumentTree]) -> MergeReport {
    let mut report = MergeReport::new();

    let root_name = primary
        .element(primary.root())
        .map(|e| e.name.clone())
        .unwrap_or_default();
    if root_name != "manifest" {
        report.error(
            vec![FileRef::new(primary.label())],
            format!("Root element of main manifest is <{root_name}>, expected <manifest>."),
        );
        return report;
    }

    let mut state = MergeState::default();
    for library in libraries {
        merge_library(primary, library, &mut state, &mut report);
    }
    report
}

/// Cross-library state: the primary's effective GL ES version is computed
/// once, on first demand, so its parse diagnostics are not repeated per
/// library (and never appear at all when no library declares a version).
#[derive(Default)]
struct MergeState {
    primary_gl: Option<PrimaryGl>,
}

#[derive(Clone, Copy)]
struct PrimaryGl {
    version: GlEsVersion,
    line: Option<u32>,
    declared: bool,
}

// ---------------------------------------------------------------------------
// Per-library driver
// ---------------------------------------------------------------------------

fn merge_library(
    primary: &mut DocumentTree,
    library: &DocumentTree,
    state: &mut MergeState,
    report: &mut MergeReport,
) {
    let lib_root = library.root();
    let root_name = library
        .element(lib_root)
        .map(|e| e.name.clone())
        .unwrap_or_default();
    if root_name != "manifest" {
        report.error(
            vec![node_ref(library, lib_root)],
            format!("Root element of library file is <{root_name}>, expected <manifest>."),
        );
        return;
    }

    let mut top_appends: Vec<NodeId> = Vec::new();
    let mut app_appends: Vec<(ElementKind, NodeId)> = Vec::new();

    // -- top-level pass ------------------------------------------------------
    let top_children: Vec<NodeId> = library.child_elements(lib_root).collect();
    for child in top_children {
        let Some(el) = library.element(child) else {
            continue;
        };
        let Some(kind) = ElementKind::from_tag(&el.name, Level::Manifest) else {
            continue;
        };
        match kind.action() {
            MergeAction::ReconcileSdk => reconcile_uses_sdk(primary, library, child, report),
            MergeAction::ReconcileFeature => {
                handle_uses_feature(primary, library, child, state, report, &mut top_appends);
            }
            MergeAction::Union => {
                handle_uses_permission(primary, library, child, report, &mut top_appends);
            }
            MergeAction::RequireEqual | MergeAction::ReconcileLibrary => {}
        }
    }

    // -- application pass ----------------------------------------------------
    if let Some(lib_app) = library.find_child_element(lib_root, "application") {
        match primary.find_child_element(primary.root(), "application") {
            Some(p_app) => {
                let app_children: Vec<NodeId> = library.child_elements(lib_app).collect();
                for child in app_children {
                    let Some(el) = library.element(child) else {
                        continue;
                    };
                    let Some(kind) = ElementKind::from_tag(&el.name, Level::Application) else {
                        continue;
                    };
                    match kind.action() {
                        MergeAction::RequireEqual => {
                            merge_keyed_element(
                                primary,
                                p_app,
                                library,
                                child,
                                kind,
                                report,
                                &mut app_appends,
                            );
                        }
                        MergeAction::ReconcileLibrary => {
                            merge_uses_library(primary, p_app, library, child, report, &mut app_appends);
                        }
                        MergeAction::Union
                        | MergeAction::ReconcileSdk
                        | MergeAction::ReconcileFeature => {}
                    }
                }
            }
            None => {
                if library.child_elements(lib_app).next().is_some() {
                    report.error(
                        vec![FileRef::new(primary.label())],
                        "Main manifest has no <application> element.",
                    );
                }
            }
        }
    }

    // -- append phase --------------------------------------------------------
    apply_top_appends(primary, library, &top_appends);
    apply_application_appends(primary, library, &app_appends);
}

// ---------------------------------------------------------------------------
// uses-sdk
// ---------------------------------------------------------------------------

/// Reconciles `minSdkVersion`: the primary's declaration is law and never
/// changes; a library demanding a higher minimum is an error.
fn reconcile_uses_sdk(
    primary: &DocumentTree,
    library: &DocumentTree,
    lib_sdk: NodeId,
    report: &mut MergeReport,
) {
    let Some(lib_attr) = android_attr(library, lib_sdk, "minSdkVersion") else {
        return;
    };
    let lib_version = match SdkVersion::try_from(lib_attr.0.as_str()) {
        Ok(v) => v,
        Err(_) => {
            report.error(
                vec![FileRef::at_line(library.label(), lib_attr.1)],
                format!(
                    "Failed to parse <uses-sdk android:minSdkVersion='{}'>: \
                     must be an integer number.",
                    lib_attr.0
                ),
            );
            return;
        }
    };

    let p_sdk = primary.find_child_element(primary.root(), "uses-sdk");
    let p_attr = p_sdk.and_then(|id| android_attr(primary, id, "minSdkVersion"));
    let (p_version, declared) = match &p_attr {
        Some((value, line)) => match SdkVersion::try_from(value.as_str()) {
            Ok(v) => (v, true),
            Err(_) => {
                report.error(
                    vec![FileRef::at_line(primary.label(), *line)],
                    format!(
                        "Failed to parse <uses-sdk android:minSdkVersion='{value}'>: \
                         must be an integer number."
                    ),
                );
                return;
            }
        },
        None => (SdkVersion::DEFAULT, false),
    };

    if lib_version > p_version {
        if !declared {
            report.warning(
                vec![FileRef::new(primary.label())],
                "Note: main manifest lacks a <uses-sdk android:minSdkVersion> declaration, \
                 which defaults to value 1.",
            );
        }
        let p_ref = match (p_attr, p_sdk) {
            (Some((_, line)), _) => FileRef::at_line(primary.label(), line),
            (None, Some(el)) => node_ref(primary, el),
            (None, None) => FileRef::new(primary.label()),
        };
        report.error(
            vec![p_ref, node_ref(library, lib_sdk)],
            format!(
                "Main manifest has <uses-sdk android:minSdkVersion='{p_version}'> \
                 but library uses minSdkVersion='{lib_version}'"
            ),
        );
    }
}

// ---------------------------------------------------------------------------
// uses-feature
// ---------------------------------------------------------------------------

/// Handles one library `uses-feature`: GL ES comparison for any element
/// carrying `glEsVersion`, name-keyed union for named features (the appended
/// copy loses its `glEsVersion` — the primary's declared requirement stays
/// authoritative).
fn handle_uses_feature(
    primary: &DocumentTree,
    library: &DocumentTree,
    lib_feature: NodeId,
    state: &mut MergeState,
    report: &mut MergeReport,
    top_appends: &mut Vec<NodeId>,
) {
    if let Some((value, line)) = android_attr(library, lib_feature, "glEsVersion") {
        match GlEsVersion::try_from(value.as_str()) {
            Err(_) => {
                report.error(
                    vec![FileRef::at_line(library.label(), line)],
                    format!(
                        "Failed to parse <uses-feature android:glEsVersion='{value}'>: \
                         must be an integer in the form 0x00020001."
                    ),
                );
            }
            Ok(v) if v.below_minimum() => {
                report.warning(
                    vec![FileRef::at_line(library.label(), line)],
                    format!(
                        "Ignoring <uses-feature android:glEsVersion='{value}'>: \
                         value is smaller than 1.0."
                    ),
                );
            }
            Ok(v) => {
                let p_gl = primary_gl(primary, state, report);
                if v > p_gl.version {
                    if !p_gl.declared {
                        report.warning(
                            vec![FileRef::new(primary.label())],
                            "Note: main manifest lacks a <uses-feature android:glEsVersion> \
                             declaration, which defaults to value 0x00010000.",
                        );
                    }
                    let p_ref = match p_gl.line {
                        Some(l) => FileRef::at_line(primary.label(), l),
                        None => FileRef::new(primary.label()),
                    };
                    report.warning(
                        vec![p_ref, FileRef::at_line(library.label(), line)],
                        format!(
                            "Main manifest has <uses-feature android:glEsVersion='{}'> \
                             but library uses glEsVersion='{v}'",
                            p_gl.version
                        ),
                    );
                }
            }
        }
    }

    let Some(el) = library.element(lib_feature) else {
        return;
    };
    let Some(name) = el.attribute_value(ANDROID_NS, "name") else {
        // A keyless uses-feature declares only a GL ES requirement and is
        // never appended.
        return;
    };

    let existing = primary.child_elements(primary.root()).find(|&c| {
        primary.element(c).is_some_and(|e| {
            e.name == "uses-feature" && e.attribute_value(ANDROID_NS, "name") == Some(name)
        })
    });
    match existing {
        None => top_appends.push(lib_feature),
        Some(p_feature) => {
            let p_gl = primary
                .element(p_feature)
                .and_then(|e| e.attribute_value(ANDROID_NS, "glEsVersion"));
            let l_gl = el.attribute_value(ANDROID_NS, "glEsVersion");
            if let (Some(pv), Some(lv)) = (p_gl, l_gl) {
                if pv != lv {
                    report.warning(
                        vec![node_ref(primary, p_feature), node_ref(library, lib_feature)],
                        format!(
                            "Conflicting <uses-feature android:name='{name}'> glEsVersion \
                             declarations; keeping main manifest value."
                        ),
                    );
                }
            }
        }
    }
}

/// The primary's effective GL ES requirement: the highest parseable
/// `glEsVersion` among its `/manifest/uses-feature` elements, or the 1.0
/// default when none declares one. Computed once per merge.
fn primary_gl(
    primary: &DocumentTree,
    state: &mut MergeState,
    report: &mut MergeReport,
) -> PrimaryGl {
    if let Some(cached) = state.primary_gl {
        return cached;
    }
    let mut best: Option<(GlEsVersion, u32)> = None;
    for child in primary.child_elements(primary.root()) {
        let Some(el) = primary.element(child) else {
            continue;
        };
        if el.name != "uses-feature" {
            continue;
        }
        let Some(attr) = el.attribute(ANDROID_NS, "glEsVersion") else {
            continue;
        };
        match GlEsVersion::try_from(attr.value.as_str()) {
            Ok(v) => {
                if best.is_none_or(|(b, _)| v > b) {
                    best = Some((v, attr.line));
                }
            }
            Err(_) => {
                report.error(
                    vec![FileRef::at_line(primary.label(), attr.line)],
                    format!(
                        "Failed to parse <uses-feature android:glEsVersion='{}'>: \
                         must be an integer in the form 0x00020001.",
                        attr.value
                    ),
                );
            }
        }
    }
    let computed = match best {
        Some((version, line)) => PrimaryGl {
            version,
            line: Some(line),
            declared: true,
        },
        None => PrimaryGl {
            version: GlEsVersion::DEFAULT,
            line: None,
            declared: false,
        },
    };
    state.primary_gl = Some(computed);
    computed
}

// ---------------------------------------------------------------------------
// uses-permission
// ---------------------------------------------------------------------------

fn handle_uses_permission(
    primary: &DocumentTree,
    library: &DocumentTree,
    lib_permission: NodeId,
    report: &mut MergeReport,
    top_appends: &mut Vec<NodeId>,
) {
    let Some(el) = library.element(lib_permission) else {
        return;
    };
    let Some(name) = el.attribute_value(ANDROID_NS, "name") else {
        let path = ElementPath::of(library, lib_permission);
        report.error(
            vec![node_ref(library, lib_permission)],
            format!("Undefined 'name' attribute in {path} element."),
        );
        return;
    };
    let exists = primary.child_elements(primary.root()).any(|c| {
        primary.element(c).is_some_and(|e| {
            e.name == "uses-permission" && e.attribute_value(ANDROID_NS, "name") == Some(name)
        })
    });
    if !exists {
        top_appends.push(lib_permission);
    }
}

// ---------------------------------------------------------------------------
// Keyed application elements
// ---------------------------------------------------------------------------

/// Activity, activity-alias, service, receiver, provider, meta-data: a key
/// collision tolerates only a semantically identical duplicate. Conflicts
/// leave the primary untouched.
fn merge_keyed_element(
    primary: &DocumentTree,
    p_app: NodeId,
    library: &DocumentTree,
    lib_el: NodeId,
    kind: ElementKind,
    report: &mut MergeReport,
    app_appends: &mut Vec<(ElementKind, NodeId)>,
) {
    let Some(el) = library.element(lib_el) else {
        return;
    };
    let Some(key) = el.attribute_value(ANDROID_NS, "name") else {
        let path = ElementPath::of(library, lib_el);
        report.error(
            vec![node_ref(library, lib_el)],
            format!("Undefined 'name' attribute in {path} element."),
        );
        return;
    };

    let target = primary.child_elements(p_app).find(|&c| {
        primary.element(c).is_some_and(|e| {
            e.name == el.name && e.attribute_value(ANDROID_NS, "name") == Some(key)
        })
    });

    let Some(target) = target else {
        app_appends.push((kind, lib_el));
        return;
    };

    let path = ElementPath::of(library, lib_el);
    if semantically_equal(primary, target, library, lib_el) {
        report.progress(
            vec![node_ref(primary, target), node_ref(library, lib_el)],
            format!("Skipping identical {path} element."),
        );
    } else {
        let mut message = format!("Trying to merge incompatible {path} element:");
        for line in element_diff(primary, target, library, lib_el) {
            message.push('\n');
            message.push_str(&line);
        }
        report.error(
            vec![node_ref(primary, target), node_ref(library, lib_el)],
            message,
        );
    }
}

// ---------------------------------------------------------------------------
// uses-library
// ---------------------------------------------------------------------------

/// `uses-library` reconciliation: a key is unioned in when new; on
/// collision, the `required` flag only ever escalates to `true` (absent and
/// unparsable values count as required). Invalid literals in the primary are
/// corrected when they are inspected.
fn merge_uses_library(
    primary: &mut DocumentTree,
    p_app: NodeId,
    library: &DocumentTree,
    lib_el: NodeId,
    report: &mut MergeReport,
    app_appends: &mut Vec<(ElementKind, NodeId)>,
) {
    let Some(el) = library.element(lib_el) else {
        return;
    };
    let Some(key) = el.attribute_value(ANDROID_NS, "name").map(str::to_owned) else {
        let path = ElementPath::of(library, lib_el);
        report.error(
            vec![node_ref(library, lib_el)],
            format!("Undefined 'name' attribute in {path} element."),
        );
        return;
    };

    let lib_required = match el.attribute(ANDROID_NS, "required") {
        None => RequiredFlag::DEFAULT.is_required(),
        Some(attr) => match RequiredFlag::try_from(attr.value.as_str()) {
            Ok(flag) => flag.is_required(),
            Err(_) => {
                let path = ElementPath::of(library, lib_el);
                report.warning(
                    vec![FileRef::at_line(library.label(), attr.line)],
                    format!(
                        "Invalid attribute 'required' in {path}: Expected 'true' or 'false' \
                         but found '{}'.",
                        attr.value
                    ),
                );
                true
            }
        },
    };

    let matches: Vec<NodeId> = primary
        .child_elements(p_app)
        .filter(|&c| {
            primary.element(c).is_some_and(|e| {
                e.name == "uses-library"
                    && e.attribute_value(ANDROID_NS, "name") == Some(key.as_str())
            })
        })
        .collect();

    if matches.is_empty() {
        app_appends.push((ElementKind::UsesLibrary, lib_el));
        return;
    }

    if matches.len() > 1 {
        report.warning(
            vec![node_ref(primary, matches[0])],
            format!("Main manifest has duplicate <uses-library android:name='{key}'> declarations."),
        );
    }

    for &m in &matches {
        let current = primary
            .element(m)
            .and_then(|e| e.attribute(ANDROID_NS, "required"))
            .map(|a| (a.value.clone(), a.line));
        match current {
            // Absent means required; nothing to escalate.
            None => {}
            Some((value, line)) => match RequiredFlag::try_from(value.as_str()) {
                Ok(flag) => {
                    if lib_required && !flag.is_required() {
                        primary.set_attribute_value(m, ANDROID_NS, "required", "true");
                    }
                }
                Err(_) => {
                    let path = ElementPath::of(primary, m);
                    report.warning(
                        vec![FileRef::at_line(primary.file_label(m).to_owned(), line)],
                        format!(
                            "Invalid attribute 'required' in {path}: Expected 'true' or 'false' \
                             but found '{value}'.",
                        ),
                    );
                    primary.set_attribute_value(m, ANDROID_NS, "required", "true");
                }
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Append phase
// ---------------------------------------------------------------------------

fn apply_top_appends(primary: &mut DocumentTree, library: &DocumentTree, appends: &[NodeId]) {
    if appends.is_empty() {
        return;
    }
    let root = primary.root();
    let indent = context_indent(primary, root);
    let mut index = insert_index(primary, root);
    for &src in appends {
        index = append_one(primary, root, index, library, src, &indent);
        let appended = last_inserted(primary, root, index);
        if primary
            .element(appended)
            .is_some_and(|e| e.name == "uses-feature")
        {
            primary.remove_attribute(appended, ANDROID_NS, "glEsVersion");
        }
    }
}

fn apply_application_appends(
    primary: &mut DocumentTree,
    library: &DocumentTree,
    appends: &[(ElementKind, NodeId)],
) {
    if appends.is_empty() {
        return;
    }
    let Some(p_app) = primary.find_child_element(primary.root(), "application") else {
        return;
    };
    let indent = context_indent(primary, p_app);
    let mut index = insert_index(primary, p_app);

    // Source marker, once per contributing library.
    let ws = primary.new_text(&format!("\n\n{indent}"), 0);
    primary.insert_child(p_app, index, ws);
    index += 1;
    let marker = primary.new_comment(&format!("<!-- # from @{} -->", library.label()), 0);
    primary.insert_child(p_app, index, marker);
    index += 1;

    for bucket in ElementKind::application_bucket_order() {
        for &(kind, src) in appends {
            if kind != *bucket {
                continue;
            }
            index = append_one(primary, p_app, index, library, src, &indent);
        }
    }
}

/// Migrates one element and its leading trivia into `parent` at `index`,
/// returning the next insertion index. When the captured trivia does not put
/// the element on its own line, one line of context indentation is
/// synthesized.
fn append_one(
    primary: &mut DocumentTree,
    parent: NodeId,
    mut index: usize,
    library: &DocumentTree,
    src: NodeId,
    indent: &str,
) -> usize {
    let run = leading_trivia(library, src);
    let own_indent = supplies_own_indent(library, &run);
    for &trivia in &run {
        let copy = primary.import_subtree(library, trivia);
        primary.insert_child(parent, index, copy);
        index += 1;
    }
    if !own_indent {
        let ws = primary.new_text(&format!("\n{indent}"), 0);
        primary.insert_child(parent, index, ws);
        index += 1;
    }
    let copy = primary.import_subtree(library, src);
    primary.insert_child(parent, index, copy);
    index + 1
}

/// New children go immediately before the parent's trailing indentation
/// node, when it has one, so the closing tag keeps its own indentation.
fn insert_index(tree: &DocumentTree, parent: NodeId) -> usize {
    let Some(el) = tree.element(parent) else {
        return 0;
    };
    let len = el.children.len();
    if len == 0 {
        return 0;
    }
    match &tree.node(el.children[len - 1]).kind {
        NodeKind::Text(t) if t.ws_only => len - 1,
        NodeKind::Text(_) | NodeKind::Comment(_) | NodeKind::Element(_) => len,
    }
}

/// The node most recently inserted by [`append_one`]: the child just before
/// `next_index`.
fn last_inserted(tree: &DocumentTree, parent: NodeId, next_index: usize) -> NodeId {
    match tree.element(parent) {
        Some(el) => el.children[next_index - 1],
        None => tree.root(),
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// A `(value, line)` pair for an android-namespace attribute of an element.
fn android_attr(tree: &DocumentTree, element: NodeId, local: &str) -> Option<(String, u32)> {
    tree.element(element)
        .and_then(|e| e.attribute(ANDROID_NS, local))
        .map(|a| (a.value.clone(), a.line))
}

/// A file reference pinned to a node's source line, using the node's own
/// provenance (relevant for previously migrated subtrees).
fn node_ref(tree: &DocumentTree, node: NodeId) -> FileRef {
    FileRef::at_line(tree.file_label(node).to_owned(), tree.node(node).line)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
