/// CLI error types with associated exit codes.
///
/// [`CliError`] is the top-level error type for the `amerge` binary. Every
/// variant maps to a stable exit code (1 or 2) via [`CliError::exit_code`]:
///
/// - Exit code **2** — input failure: an input could not be read or parsed
///   at all. These errors terminate before the merge engine runs.
/// - Exit code **1** — logical failure: the merge ran to completion and
///   recorded at least one error diagnostic.
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CliError
// ---------------------------------------------------------------------------

/// All error conditions the `amerge` CLI can produce.
#[derive(Debug)]
pub enum CliError {
    // --- Exit code 2: input failures ---
    /// A file argument could not be found on the filesystem.
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The process lacks permission to read a file.
    PermissionDenied {
        /// The path that could not be read.
        path: PathBuf,
    },

    /// The input exceeds the configured `--max-file-size` limit.
    FileTooLarge {
        /// The offending path.
        path: PathBuf,
        /// The configured size limit in bytes.
        limit: u64,
        /// The actual size in bytes.
        actual: u64,
    },

    /// The input bytes are not valid UTF-8.
    InvalidUtf8 {
        /// The offending path.
        path: PathBuf,
    },

    /// The input is not well-formed XML.
    XmlSyntax {
        /// The offending path.
        path: PathBuf,
        /// The parser's description of the failure.
        detail: String,
    },

    /// A generic I/O error not covered by the more specific variants above.
    IoError {
        /// A human-readable label for the source or sink.
        source: String,
        /// The underlying I/O error message.
        detail: String,
    },

    // --- Exit code 1: logical failures ---
    /// The merge recorded one or more error diagnostics.
    ///
    /// The diagnostics have already been printed; this variant exists so
    /// `main` can exit with code 1 cleanly.
    MergeErrors,
}

impl CliError {
    /// Returns the process exit code for this error.
    ///
    /// - `2` — input failure (file not found, parse error, etc.).
    /// - `1` — logical failure (the merge reported errors).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::FileTooLarge { .. }
            | Self::InvalidUtf8 { .. }
            | Self::XmlSyntax { .. }
            | Self::IoError { .. } => 2,

            Self::MergeErrors => 1,
        }
    }

    /// Returns a human-readable error message suitable for stderr.
    pub fn message(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("error: file not found: {}", path.display())
            }
            Self::PermissionDenied { path } => {
                format!("error: permission denied: {}", path.display())
            }
            Self::FileTooLarge {
                path,
                limit,
                actual,
            } => {
                format!(
                    "error: file too large: {} is {actual} bytes, limit is {limit} bytes",
                    path.display()
                )
            }
            Self::InvalidUtf8 { path } => {
                format!("error: invalid UTF-8 in {}", path.display())
            }
            Self::XmlSyntax { path, detail } => {
                format!("error: failed to parse {}: {detail}", path.display())
            }
            Self::IoError { source, detail } => {
                format!("error: I/O error on {source}: {detail}")
            }
            Self::MergeErrors => "error: manifest merge failed with one or more errors".to_owned(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
