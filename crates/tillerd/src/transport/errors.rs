//! Error types for socket listener operations.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors surfaced while binding or running the socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// A file left at the socket path could not be removed.
    #[error("failed to remove existing file at {path}: {source}")]
    StaleCleanup {
        /// Socket path that was occupied.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
    /// Binding the domain socket failed.
    #[error("failed to bind unix listener at {path}: {source}")]
    Bind {
        /// Socket path that could not be bound.
        path: Utf8PathBuf,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// Switching the listener to non-blocking accepts failed.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The accept loop panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}
