//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tiller_proto::ClientError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("{0}")]
    Client(#[from] ClientError),
    #[error("{verb} failed: {message}")]
    Rejected { verb: String, message: String },
    #[error("failed to write output: {0}")]
    Output(io::Error),
}

/// Determines whether an error indicates the daemon is not running.
///
/// Returns true for connection-refused and socket-not-found errors.
pub(crate) fn is_daemon_not_running(error: &AppError) -> bool {
    match error {
        AppError::Client(ClientError::Connect { source, .. }) => matches!(
            source.kind(),
            io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
        ),
        _ => false,
    }
}
