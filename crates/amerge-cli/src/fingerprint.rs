//! Dependency fingerprint for incremental builds.
//!
//! A fingerprint records, for every input manifest, its path, size,
//! modification time, and SHA-256 content digest. The merge command skips
//! the merge when the stored fingerprint matches the current inputs and the
//! output file still exists — the engine itself is purely functional on its
//! inputs; this change detection is driver plumbing.
//!
//! Any unreadable or unparsable fingerprint file is treated as stale, never
//! as an error: the worst case is one redundant merge.
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CliError;

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// One input file's identity at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEntry {
    /// The path as given on the command line.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// Modification time: whole seconds since the Unix epoch.
    pub mtime_secs: u64,
    /// Modification time: subsecond nanoseconds.
    pub mtime_nanos: u32,
    /// Lowercase hex SHA-256 of the file contents.
    pub sha256: String,
}

/// The set of input identities a merge ran against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fingerprint {
    /// One entry per input, in command-line order.
    pub entries: Vec<InputEntry>,
}

impl Fingerprint {
    /// Captures the current identity of every input path.
    ///
    /// # Errors
    ///
    /// Propagates filesystem failures as [`CliError`] — inputs that cannot
    /// be read now will not be readable for the merge either.
    pub fn capture<P: AsRef<Path>>(paths: &[P]) -> Result<Self, CliError> {
        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let metadata = std::fs::metadata(path).map_err(|e| CliError::IoError {
                source: path.display().to_string(),
                detail: e.to_string(),
            })?;
            let (mtime_secs, mtime_nanos) = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| (d.as_secs(), d.subsec_nanos()))
                .unwrap_or((0, 0));
            let bytes = std::fs::read(path).map_err(|e| CliError::IoError {
                source: path.display().to_string(),
                detail: e.to_string(),
            })?;
            entries.push(InputEntry {
                path: path.display().to_string(),
                size: metadata.len(),
                mtime_secs,
                mtime_nanos,
                sha256: sha256_hex(&bytes),
            });
        }
        Ok(Self { entries })
    }

    /// Loads a previously stored fingerprint. `None` when the file is
    /// missing, unreadable, or not a fingerprint — all mean "stale".
    pub fn load(path: &Path) -> Option<Self> {
        let text = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&text).ok()
    }

    /// Stores the fingerprint as JSON.
    ///
    /// # Errors
    ///
    /// [`CliError::IoError`] when the file cannot be written.
    pub fn store(&self, path: &Path) -> Result<(), CliError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| CliError::IoError {
            source: path.display().to_string(),
            detail: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| CliError::IoError {
            source: path.display().to_string(),
            detail: e.to_string(),
        })
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::io::Write as _;

    use super::*;

    #[test]
    fn capture_store_load_round_trip() {
        let mut input = tempfile::NamedTempFile::new().expect("temp input");
        write!(input, "<manifest/>").expect("write");

        let captured = Fingerprint::capture(&[input.path()]).expect("capturable");
        assert_eq!(captured.entries.len(), 1);
        assert_eq!(captured.entries[0].size, 11);
        assert_eq!(captured.entries[0].sha256.len(), 64);

        let dir = tempfile::tempdir().expect("temp dir");
        let mark = dir.path().join("deps.json");
        captured.store(&mark).expect("storable");
        let loaded = Fingerprint::load(&mark).expect("loadable");
        assert_eq!(loaded, captured);
    }

    #[test]
    fn content_change_changes_the_fingerprint() {
        let mut input = tempfile::NamedTempFile::new().expect("temp input");
        write!(input, "<manifest/>").expect("write");
        let before = Fingerprint::capture(&[input.path()]).expect("capturable");

        write!(input, "<!-- more -->").expect("append");
        input.flush().expect("flush");
        let after = Fingerprint::capture(&[input.path()]).expect("capturable");

        assert_ne!(before, after);
        assert_ne!(before.entries[0].sha256, after.entries[0].sha256);
    }

    #[test]
    fn missing_fingerprint_file_loads_as_none() {
        assert!(Fingerprint::load(Path::new("/nope/deps.json")).is_none());
    }

    #[test]
    fn garbage_fingerprint_file_loads_as_none() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "not json at all").expect("write");
        assert!(Fingerprint::load(file.path()).is_none());
    }

    #[test]
    fn missing_input_is_an_error() {
        let err =
            Fingerprint::capture(&[Path::new("/nope/missing.xml")]).expect_err("must fail");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn sha256_hex_is_stable() {
        // SHA-256 of the empty string.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
