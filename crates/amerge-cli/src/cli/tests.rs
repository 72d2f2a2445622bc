#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(clippy::wildcard_enum_match_arm)]

use std::path::PathBuf;

use clap::CommandFactory;
use clap::Parser;

use super::*;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn merge_parses_main_and_libraries_in_order() {
    let cli = Cli::try_parse_from(["amerge", "merge", "main.xml", "lib1.xml", "lib2.xml"])
        .expect("valid invocation");
    match cli.command {
        Command::Merge {
            main, libraries, ..
        } => {
            assert_eq!(main, PathBuf::from("main.xml"));
            assert_eq!(
                libraries,
                vec![PathBuf::from("lib1.xml"), PathBuf::from("lib2.xml")]
            );
        }
        Command::Inspect { .. } => panic!("expected merge command"),
    }
}

#[test]
fn merge_accepts_zero_libraries() {
    let cli = Cli::try_parse_from(["amerge", "merge", "main.xml"]).expect("valid invocation");
    match cli.command {
        Command::Merge { libraries, .. } => assert!(libraries.is_empty()),
        Command::Inspect { .. } => panic!("expected merge command"),
    }
}

#[test]
fn mark_requires_out() {
    let result = Cli::try_parse_from(["amerge", "merge", "main.xml", "--mark", "deps.json"]);
    assert!(result.is_err(), "--mark without --out must be rejected");

    let cli = Cli::try_parse_from([
        "amerge",
        "merge",
        "main.xml",
        "lib.xml",
        "-o",
        "merged.xml",
        "--mark",
        "deps.json",
    ])
    .expect("valid invocation");
    match cli.command {
        Command::Merge { out, mark, .. } => {
            assert_eq!(out, Some(PathBuf::from("merged.xml")));
            assert_eq!(mark, Some(PathBuf::from("deps.json")));
        }
        Command::Inspect { .. } => panic!("expected merge command"),
    }
}

#[test]
fn format_defaults_to_human() {
    let cli = Cli::try_parse_from(["amerge", "inspect", "m.xml"]).expect("valid invocation");
    assert!(matches!(cli.format, OutputFormat::Human));
    assert!(!cli.verbose);
}

#[test]
fn global_flags_parse_after_subcommand() {
    let cli = Cli::try_parse_from([
        "amerge", "merge", "m.xml", "--format", "json", "--verbose",
    ])
    .expect("valid invocation");
    assert!(matches!(cli.format, OutputFormat::Json));
    assert!(cli.verbose);
}
