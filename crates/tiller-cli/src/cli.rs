//! CLI argument definitions for the `tiller` client.

use std::num::NonZeroU64;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Command-line interface for the Tiller control socket.
#[derive(Parser, Debug)]
#[command(name = "tiller", disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Command socket to dial, overriding the configured path.
    #[arg(long, value_name = "PATH")]
    pub(crate) socket: Option<Utf8PathBuf>,
    /// The command to send.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Commands understood by the daemon.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Stops the proxy engine.
    Stop,
    /// Reloads the proxy engine configuration.
    Reload,
    /// Closes every proxied connection.
    CloseConnections,
    /// Streams periodic status records.
    Status {
        /// Milliseconds between records.
        #[arg(long, value_name = "N", default_value = "1000")]
        interval_ms: NonZeroU64,
        /// Stops after this many records.
        #[arg(long, value_name = "K")]
        count: Option<usize>,
    },
    /// Streams the daemon log: recent history first, then live lines.
    Logs {
        /// Stops after this many lines.
        #[arg(long, value_name = "K")]
        count: Option<usize>,
    },
}
