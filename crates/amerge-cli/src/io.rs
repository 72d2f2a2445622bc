//! File reading and output writing for the `amerge` binary.
//!
//! Reading enforces the size cap before touching file contents and keeps the
//! UTF-8 check explicit so the error carries the offending path. Writing
//! goes to a path or to stdout; the merged document is emitted exactly as
//! serialized, with no trailing newline appended (the document's own
//! epilogue is authoritative).
use std::io::Write as _;
use std::path::Path;

use crate::error::CliError;

/// Reads a manifest file into a string, enforcing `max_file_size`.
///
/// # Errors
///
/// [`CliError::FileNotFound`] / [`CliError::PermissionDenied`] /
/// [`CliError::IoError`] for filesystem failures, [`CliError::FileTooLarge`]
/// when the size cap is exceeded, [`CliError::InvalidUtf8`] for non-UTF-8
/// content.
pub fn read_manifest(path: &Path, max_file_size: u64) -> Result<String, CliError> {
    let metadata = std::fs::metadata(path).map_err(|e| classify_io(path, &e))?;
    if metadata.len() > max_file_size {
        return Err(CliError::FileTooLarge {
            path: path.to_path_buf(),
            limit: max_file_size,
            actual: metadata.len(),
        });
    }
    let bytes = std::fs::read(path).map_err(|e| classify_io(path, &e))?;
    String::from_utf8(bytes).map_err(|_| CliError::InvalidUtf8 {
        path: path.to_path_buf(),
    })
}

/// Writes the merged document to `out`, or to stdout when `out` is `None`.
pub fn write_output(out: Option<&Path>, content: &str) -> Result<(), CliError> {
    match out {
        Some(path) => std::fs::write(path, content).map_err(|e| CliError::IoError {
            source: path.display().to_string(),
            detail: e.to_string(),
        }),
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(content.as_bytes())
                .map_err(|e| CliError::IoError {
                    source: "stdout".to_owned(),
                    detail: e.to_string(),
                })
        }
    }
}

/// The label a manifest is known by in diagnostics: the path as given.
pub fn label(path: &Path) -> String {
    path.display().to_string()
}

fn classify_io(path: &Path, error: &std::io::Error) -> CliError {
    match error.kind() {
        std::io::ErrorKind::NotFound => CliError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => CliError::PermissionDenied {
            path: path.to_path_buf(),
        },
        // All other I/O error kinds are wrapped in the generic IoError
        // variant. A few common ones are listed explicitly to satisfy the
        // exhaustiveness lint while still routing everything unknown there.
        std::io::ErrorKind::Interrupted
        | std::io::ErrorKind::InvalidData
        | std::io::ErrorKind::IsADirectory
        | std::io::ErrorKind::NotADirectory
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::UnexpectedEof
        | std::io::ErrorKind::TimedOut
        | std::io::ErrorKind::StorageFull
        | std::io::ErrorKind::Other
        | _ => CliError::IoError {
            source: path.display().to_string(),
            detail: error.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
