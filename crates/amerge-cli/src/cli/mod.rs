//! Clap CLI definition: root struct, subcommands, and shared argument types.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[cfg(test)]
mod tests;

/// Output format for diagnostics.
///
/// `Human` prints each diagnostic in its stable textual form; `Json` prints
/// one JSON object per diagnostic (NDJSON). Both go to stderr; stdout is
/// reserved for the merged document.
#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default).
    Human,
    /// One JSON object per diagnostic.
    Json,
}

/// The application manifest merger.
///
/// Folds the declared components of library manifests into an application
/// manifest ahead of packaging, preserving the application manifest's
/// formatting exactly.
#[derive(Parser)]
#[command(name = "amerge", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Diagnostic output format.
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Maximum size in bytes for any input manifest.
    #[arg(
        long,
        global = true,
        value_name = "BYTES",
        env = "AMERGE_MAX_FILE_SIZE",
        default_value_t = 10 * 1024 * 1024
    )]
    pub max_file_size: u64,

    /// Also print progress-level diagnostics.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All top-level subcommands exposed by the `amerge` binary.
#[derive(Subcommand)]
pub enum Command {
    /// Merge library manifests into an application manifest.
    Merge {
        /// The application (primary) manifest.
        #[arg(value_name = "MAIN")]
        main: PathBuf,

        /// Library manifests, folded in the order given.
        #[arg(value_name = "LIBRARY")]
        libraries: Vec<PathBuf>,

        /// Write the merged manifest here instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Dependency fingerprint file: when it matches the current inputs
        /// and the output file exists, the merge is skipped; rewritten after
        /// every successful merge.
        #[arg(long, value_name = "FILE", requires = "out")]
        mark: Option<PathBuf>,
    },

    /// Print a summary of a manifest's recognized components.
    Inspect {
        /// Path to a manifest file.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}
