//! CLI entrypoint for the Tiller control socket.
//!
//! The binary delegates to [`tiller_cli::run`], which loads configuration,
//! parses the subcommand and talks to the daemon over its command socket.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    tiller_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
