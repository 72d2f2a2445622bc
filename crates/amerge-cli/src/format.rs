//! Diagnostic rendering for the two output formats.
//!
//! Human output is each diagnostic's stable Display form; JSON output is one
//! serialized object per diagnostic (NDJSON). Progress records are shown
//! only with `--verbose` in human mode, but always present in JSON — a
//! machine consumer filters for itself.
use std::io::Write;

use amerge_core::{MergeReport, Severity};

use crate::OutputFormat;
use crate::error::CliError;

/// Renders a merge report to `sink` in the requested format.
///
/// # Errors
///
/// [`CliError::IoError`] when the sink rejects a write.
pub fn render_report(
    report: &MergeReport,
    format: &OutputFormat,
    verbose: bool,
    sink: &mut dyn Write,
) -> Result<(), CliError> {
    for diagnostic in &report.diagnostics {
        match format {
            OutputFormat::Human => {
                if diagnostic.severity == Severity::Progress && !verbose {
                    continue;
                }
                writeln!(sink, "{diagnostic}").map_err(sink_error)?;
            }
            OutputFormat::Json => {
                let line = serde_json::to_string(diagnostic).map_err(|e| CliError::IoError {
                    source: "diagnostics".to_owned(),
                    detail: e.to_string(),
                })?;
                writeln!(sink, "{line}").map_err(sink_error)?;
            }
        }
    }
    Ok(())
}

fn sink_error(e: std::io::Error) -> CliError {
    CliError::IoError {
        source: "stderr".to_owned(),
        detail: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use amerge_core::FileRef;

    use super::*;

    fn sample_report() -> MergeReport {
        let mut report = MergeReport::new();
        report.progress(vec![FileRef::at_line("main.xml", 3)], "Skipping identical x element.");
        report.warning(vec![], "something advisory");
        report.error(vec![FileRef::at_line("lib.xml", 9)], "something fatal");
        report
    }

    fn render_to_string(format: &OutputFormat, verbose: bool) -> String {
        let mut buf = Vec::new();
        render_report(&sample_report(), format, verbose, &mut buf).expect("renders");
        String::from_utf8(buf).expect("utf8 output")
    }

    #[test]
    fn human_hides_progress_by_default() {
        let out = render_to_string(&OutputFormat::Human, false);
        assert_eq!(
            out,
            "W something advisory\nE [lib.xml:9] something fatal\n"
        );
    }

    #[test]
    fn human_verbose_shows_progress() {
        let out = render_to_string(&OutputFormat::Human, true);
        assert!(out.starts_with("P [main.xml:3] Skipping identical"));
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn json_emits_one_object_per_line_including_progress() {
        let out = render_to_string(&OutputFormat::Json, false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).expect("valid json line");
            assert!(value["severity"].is_string());
            assert!(value["message"].is_string());
        }
    }
}
