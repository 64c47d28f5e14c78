//! Error types for connection handling.

use std::io;

use thiserror::Error;
use tiller_proto::{CodecError, ProtocolError};

/// Reasons a connection ended abnormally.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Reading or writing the stream failed.
    #[error("transport failure: {source}")]
    Transport {
        /// Underlying framing error.
        #[source]
        source: CodecError,
    },
    /// The client violated the command protocol.
    #[error("protocol violation: {source}")]
    Protocol {
        /// Underlying protocol error.
        #[source]
        source: ProtocolError,
    },
    /// The liveness watcher could not be started.
    #[error("failed to watch client liveness: {source}")]
    Watch {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl ConnectionError {
    /// Reports whether the error only means the client went away.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Transport { source } => source.is_closed(),
            Self::Protocol { .. } | Self::Watch { .. } => false,
        }
    }
}

impl From<CodecError> for ConnectionError {
    fn from(source: CodecError) -> Self {
        Self::Transport { source }
    }
}

impl From<ProtocolError> for ConnectionError {
    fn from(source: ProtocolError) -> Self {
        Self::Protocol { source }
    }
}
