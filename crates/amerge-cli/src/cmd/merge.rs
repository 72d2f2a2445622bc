//! Implementation of `amerge merge <MAIN> <LIBRARY>...`.
//!
//! Parses every input, runs the merge engine, prints the diagnostics to
//! stderr, and writes the merged document to `--out` (or stdout). With
//! `--mark`, a dependency fingerprint short-circuits the whole run when
//! nothing changed since the last successful merge.
//!
//! Exit codes:
//! - 0 = success (no error diagnostics)
//! - 1 = the merge recorded errors
//! - 2 = an input could not be read or parsed
use std::path::Path;

use amerge_core::{DocumentTree, merge, parse_document, write_document};

use crate::OutputFormat;
use crate::error::CliError;
use crate::fingerprint::Fingerprint;
use crate::format::render_report;
use crate::io::{label, read_manifest, write_output};

/// Runs the `merge` command.
///
/// # Errors
///
/// Input failures ([`CliError::FileNotFound`], [`CliError::XmlSyntax`], …)
/// abort before the engine runs; [`CliError::MergeErrors`] reports that the
/// engine recorded at least one error diagnostic.
pub fn run(
    main: &Path,
    libraries: &[std::path::PathBuf],
    out: Option<&Path>,
    mark: Option<&Path>,
    format: &OutputFormat,
    max_file_size: u64,
    verbose: bool,
) -> Result<(), CliError> {
    // Change detection: skip the merge when the recorded fingerprint still
    // matches every input and the output exists. Clap guarantees --mark
    // only appears together with --out.
    let current = match mark {
        Some(_) => {
            let mut inputs: Vec<&Path> = vec![main];
            inputs.extend(libraries.iter().map(std::path::PathBuf::as_path));
            Some(Fingerprint::capture(&inputs)?)
        }
        None => None,
    };
    if let (Some(mark_path), Some(current)) = (mark, current.as_ref()) {
        let output_exists = out.is_some_and(Path::exists);
        if output_exists && Fingerprint::load(mark_path).as_ref() == Some(current) {
            if verbose {
                eprintln!("amerge: inputs unchanged, skipping merge");
            }
            return Ok(());
        }
    }

    let mut primary = parse_input(main, max_file_size)?;
    let mut libs: Vec<DocumentTree> = Vec::with_capacity(libraries.len());
    for path in libraries {
        libs.push(parse_input(path, max_file_size)?);
    }

    let report = merge(&mut primary, &libs);

    let stderr = std::io::stderr();
    let mut err_out = stderr.lock();
    render_report(&report, format, verbose, &mut err_out)?;

    if !report.is_success() {
        return Err(CliError::MergeErrors);
    }

    write_output(out, &write_document(&primary))?;

    if let (Some(mark_path), Some(current)) = (mark, current) {
        current.store(mark_path)?;
    }
    Ok(())
}

fn parse_input(path: &Path, max_file_size: u64) -> Result<DocumentTree, CliError> {
    let text = read_manifest(path, max_file_size)?;
    parse_document(&text, &label(path)).map_err(|e| CliError::XmlSyntax {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
