/// Diagnostic types and the merge report sink.
///
/// Every observable outcome of a merge is a [`Diagnostic`] appended to a
/// [`MergeReport`] — the engine never fails fast and never prints. The
/// rendered text form is stable and deterministic; tests compare it
/// literally, and the driver serializes the same records as NDJSON.
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// The severity of a merge diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational: the engine did something worth noting (e.g. skipped
    /// an identical duplicate). Rendered as `P`.
    Progress,
    /// Advisory: the inputs are questionable but the merge proceeds.
    /// Rendered as `W`.
    Warning,
    /// The merge result is incomplete or the inputs conflict. Any error
    /// makes the overall merge unsuccessful. Rendered as `E`.
    Error,
}

impl Severity {
    /// The single-character tag used in the textual form.
    pub fn tag(self) -> char {
        match self {
            Self::Progress => 'P',
            Self::Warning => 'W',
            Self::Error => 'E',
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// ---------------------------------------------------------------------------
// FileRef
// ---------------------------------------------------------------------------

/// A reference to a source file, optionally pinned to a line.
///
/// When a diagnostic references both sides of a merge, the primary
/// document's reference comes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRef {
    /// The file label as supplied by the driver.
    pub file: String,
    /// 1-based source line, when the diagnostic is tied to one.
    pub line: Option<u32>,
}

impl FileRef {
    /// A reference to a whole file.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }

    /// A reference to a specific line of a file.
    pub fn at_line(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
        }
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}", self.file),
            None => f.write_str(&self.file),
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

/// A single structured merge diagnostic.
///
/// Textual form: `<S> [<ref>, <ref>] <message>`, with the bracketed section
/// omitted when no file is referenced. Incompatible-element diagnostics have
/// multi-line messages; the continuation lines follow the header line
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// How serious the finding is.
    pub severity: Severity,
    /// Referenced files, primary first where both sides appear.
    pub refs: Vec<FileRef>,
    /// The expanded message text.
    pub message: String,
}

impl Diagnostic {
    /// Constructs a diagnostic.
    pub fn new(severity: Severity, refs: Vec<FileRef>, message: impl Into<String>) -> Self {
        Self {
            severity,
            refs,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if !self.refs.is_empty() {
            f.write_str(" [")?;
            for (i, r) in self.refs.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{r}")?;
            }
            f.write_str("]")?;
        }
        write!(f, " {}", self.message)
    }
}

// ---------------------------------------------------------------------------
// MergeReport
// ---------------------------------------------------------------------------

/// The ordered collection of diagnostics produced by one merge call.
///
/// Emission order is deterministic: libraries in input order, elements in
/// document order within each library. The report never deduplicates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MergeReport {
    /// All diagnostics, in emission order.
    pub diagnostics: Vec<Diagnostic>,
}

impl MergeReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pre-built diagnostic.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Appends an error.
    pub fn error(&mut self, refs: Vec<FileRef>, message: impl Into<String>) {
        self.record(Diagnostic::new(Severity::Error, refs, message));
    }

    /// Appends a warning.
    pub fn warning(&mut self, refs: Vec<FileRef>, message: impl Into<String>) {
        self.record(Diagnostic::new(Severity::Warning, refs, message));
    }

    /// Appends a progress record.
    pub fn progress(&mut self, refs: Vec<FileRef>, message: impl Into<String>) {
        self.record(Diagnostic::new(Severity::Progress, refs, message));
    }

    /// `true` when any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// The engine's overall success signal: no error was recorded. The
    /// driver maps this to the process exit code.
    pub fn is_success(&self) -> bool {
        !self.has_errors()
    }

    /// Iterates the error diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Iterates the warning diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Iterates the progress diagnostics.
    pub fn progresses(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Progress)
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// `true` when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Renders the whole report in its stable textual form, one diagnostic
    /// per line (multi-line messages span several physical lines).
    pub fn render(&self) -> String {
        let mut out = String::new();
        for d in &self.diagnostics {
            out.push_str(&d.to_string());
            out.push('\n');
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
