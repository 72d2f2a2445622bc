pub mod cli;
pub mod cmd;
pub mod error;
pub mod fingerprint;
pub mod format;
pub mod io;

pub use cli::{Cli, Command, OutputFormat};

use clap::Parser;

fn main() {
    #[cfg(unix)]
    install_sigpipe_default();

    let cli = Cli::parse();

    let result = dispatch(&cli);

    if let Err(e) = result {
        eprintln!("{}", e.message());
        std::process::exit(e.exit_code());
    }
}

/// Dispatches the parsed CLI arguments to the appropriate command handler.
///
/// Returns `Ok(())` on success or a [`error::CliError`] on failure. The
/// caller is responsible for printing the error message and exiting with the
/// appropriate exit code.
fn dispatch(cli: &Cli) -> Result<(), error::CliError> {
    match &cli.command {
        Command::Merge {
            main,
            libraries,
            out,
            mark,
        } => cmd::merge::run(
            main,
            libraries,
            out.as_deref(),
            mark.as_deref(),
            &cli.format,
            cli.max_file_size,
            cli.verbose,
        ),

        Command::Inspect { file } => cmd::inspect::run(file, cli.max_file_size),
    }
}

/// Resets `SIGPIPE` to its default disposition (`SIG_DFL`).
///
/// Rust's runtime ignores `SIGPIPE` by default, which causes programs that
/// write to a closed pipe (e.g. `amerge merge main.xml lib.xml | head`) to
/// receive an `Err(BrokenPipe)` from a write call rather than being
/// terminated silently. Restoring the default disposition lets the kernel
/// terminate the process the standard Unix way when a write to a closed pipe
/// occurs.
#[cfg(unix)]
fn install_sigpipe_default() {
    // SAFETY: signal() is safe to call during single-threaded program
    // initialization before any other threads are spawned. SIG_DFL is a
    // valid handler for SIGPIPE. The return value (previous handler) is
    // discarded.
    //
    // The workspace denies `unsafe_code` globally; this is the minimal
    // unavoidable use of libc required for SIGPIPE handling on Unix, scoped
    // with an inline allow so the unsafe surface stays as narrow as
    // possible.
    #[allow(unsafe_code)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
}
