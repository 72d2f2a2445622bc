#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use super::*;
use crate::kinds::ANDROID_NS;

fn parse(input: &str) -> DocumentTree {
    parse_document(input, "test.xml").expect("valid test document")
}

fn round_trip(input: &str) {
    let tree = parse(input);
    assert_eq!(write_document(&tree), input, "round trip must be identity");
}

// ---------------------------------------------------------------------------
// Round-trip fidelity
// ---------------------------------------------------------------------------

#[test]
fn round_trip_minimal() {
    round_trip("<manifest/>");
}

#[test]
fn round_trip_declaration_and_prologue_comment() {
    round_trip(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<!-- build output -->\n<manifest>\n</manifest>\n",
    );
}

#[test]
fn round_trip_preserves_attribute_formatting() {
    // Mixed quotes, uneven gaps, whitespace around '=', multi-line tags.
    round_trip(
        "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\">\n\
         \x20   <activity\n\
         \x20           android:name='com.example.A'\n\
         \x20           android:label = \"Hi &amp; bye\"  />\n\
         </manifest>",
    );
}

#[test]
fn round_trip_preserves_comments_and_blank_lines() {
    round_trip(
        "<manifest>\n\
         \n\
         \x20   <!-- first -->\n\
         \x20   <!-- second -->\n\
         \x20   <application>\n\
         \x20       <activity android:name=\"X\"/>\n\
         \x20   </application>\n\
         \n\
         </manifest>\n\
         <!-- trailing -->\n",
    );
}

#[test]
fn round_trip_text_content_with_entities() {
    round_trip("<manifest><note>a &lt; b &amp; c</note></manifest>");
}

#[test]
fn round_trip_cdata() {
    round_trip("<manifest><note><![CDATA[raw < text]]></note></manifest>");
}

// ---------------------------------------------------------------------------
// Parsed structure
// ---------------------------------------------------------------------------

#[test]
fn attribute_values_are_unescaped() {
    let tree = parse("<manifest><x label=\"a &amp; b\"/></manifest>");
    let x = tree.find_child_element(tree.root(), "x").expect("x");
    let el = tree.element(x).expect("element");
    assert_eq!(el.attribute_value("", "label"), Some("a & b"));
    assert_eq!(el.attributes[0].raw_value, "a &amp; b");
}

#[test]
fn android_prefix_resolves_to_android_namespace() {
    let tree = parse(
        "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\">\
         <uses-sdk android:minSdkVersion=\"4\"/></manifest>",
    );
    let sdk = tree
        .find_child_element(tree.root(), "uses-sdk")
        .expect("uses-sdk");
    let el = tree.element(sdk).expect("element");
    let attr = el.attribute(ANDROID_NS, "minSdkVersion").expect("attr");
    assert_eq!(attr.prefix.as_deref(), Some("android"));
    assert_eq!(attr.value, "4");
}

#[test]
fn custom_prefix_for_android_namespace_still_matches() {
    // Two documents can bind different prefixes to the same URI.
    let tree = parse(
        "<manifest xmlns:a=\"http://schemas.android.com/apk/res/android\">\
         <uses-sdk a:minSdkVersion=\"4\"/></manifest>",
    );
    let sdk = tree
        .find_child_element(tree.root(), "uses-sdk")
        .expect("uses-sdk");
    let el = tree.element(sdk).expect("element");
    assert!(el.attribute(ANDROID_NS, "minSdkVersion").is_some());
}

#[test]
fn unbound_prefix_keeps_prefix_as_pseudo_namespace() {
    let tree = parse("<manifest><x tools:node=\"merge\"/></manifest>");
    let x = tree.find_child_element(tree.root(), "x").expect("x");
    let el = tree.element(x).expect("element");
    assert_eq!(el.attributes[0].ns_uri, "tools");
}

#[test]
fn xmlns_declaration_is_kept_as_an_attribute() {
    let tree = parse("<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\"/>");
    let el = tree.element(tree.root()).expect("root element");
    assert_eq!(el.attributes.len(), 1);
    assert_eq!(el.attributes[0].ns_uri, XMLNS_NS);
    assert_eq!(el.attributes[0].local, "android");
}

#[test]
fn attribute_lines_span_multi_line_tags() {
    let tree = parse("<manifest>\n<activity\n    android:name=\"A\"\n    android:label=\"B\"/>\n</manifest>");
    let activity = tree
        .find_child_element(tree.root(), "activity")
        .expect("activity");
    let el = tree.element(activity).expect("element");
    assert_eq!(tree.node(activity).line, 2);
    assert_eq!(el.attributes[0].line, 3);
    assert_eq!(el.attributes[1].line, 4);
}

#[test]
fn non_manifest_root_is_accepted_by_the_codec() {
    // The engine reports wrong roots; the codec must not reject them.
    let tree = parse_document("<merge><activity/></merge>", "lib.xml").expect("parses");
    assert_eq!(tree.element(tree.root()).expect("root").name, "merge");
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn empty_input_has_no_root() {
    let err = parse_document("", "e.xml").expect_err("no root");
    assert_eq!(err, XmlError::NoRootElement);
}

#[test]
fn whitespace_only_input_has_no_root() {
    let err = parse_document("   \n  ", "e.xml").expect_err("no root");
    assert_eq!(err, XmlError::NoRootElement);
}

#[test]
fn unclosed_element_is_rejected() {
    // Depending on the tokenizer's end-of-input handling this surfaces
    // either as our own unclosed-element check or as a tokenizer error;
    // both are parse failures with the right shape.
    let err = parse_document("<manifest><application>", "e.xml").expect_err("unclosed");
    match err {
        XmlError::UnclosedElement { name } => assert_eq!(name, "application"),
        XmlError::Syntax { .. } => {}
        XmlError::NoRootElement | XmlError::MultipleRootElements { .. } => {
            panic!("expected an unclosed-element failure, got {err}")
        }
    }
}

#[test]
fn second_root_is_rejected() {
    let err = parse_document("<manifest/><manifest/>", "e.xml").expect_err("two roots");
    assert!(matches!(err, XmlError::MultipleRootElements { .. }));
}

#[test]
fn mismatched_end_tag_is_a_syntax_error() {
    let err = parse_document("<manifest><a></b></manifest>", "e.xml").expect_err("mismatch");
    assert!(matches!(err, XmlError::Syntax { .. }));
}

#[test]
fn error_display_mentions_line() {
    let err = XmlError::Syntax {
        detail: "boom".to_owned(),
        line: 7,
    };
    let msg = err.to_string();
    assert!(msg.contains("line 7"), "message: {msg}");
    assert!(msg.contains("boom"), "message: {msg}");
}

// ---------------------------------------------------------------------------
// Mutated-tree serialization
// ---------------------------------------------------------------------------

#[test]
fn rewritten_attribute_changes_only_its_value_text() {
    let input = "<manifest xmlns:android=\"http://schemas.android.com/apk/res/android\">\n\
                 \x20 <application>\n\
                 \x20   <uses-library android:name=\"L\" android:required=\"false\" />\n\
                 \x20 </application>\n\
                 </manifest>";
    let mut tree = parse(input);
    let app = tree
        .find_child_element(tree.root(), "application")
        .expect("application");
    let lib = tree.find_child_element(app, "uses-library").expect("lib");
    assert!(tree.set_attribute_value(lib, ANDROID_NS, "required", "true"));
    let expected = input.replace("android:required=\"false\"", "android:required=\"true\"");
    assert_eq!(write_document(&tree), expected);
}
