//! Error types for framing and protocol validation.

use std::io;

use thiserror::Error;

/// Violations of the command protocol by a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The first byte of a connection did not name a known command.
    #[error("unknown command: {0}")]
    UnknownCommand(u8),
    /// A status request asked for a non-positive polling interval.
    #[error("invalid status interval: {0}ns")]
    InvalidInterval(i64),
}

/// Failures raised while reading or writing framed values.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Reading from the stream failed.
    #[error("failed to read {context}: {source}")]
    Read {
        /// Value being read when the failure occurred.
        context: &'static str,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Writing to the stream failed.
    #[error("failed to write {context}: {source}")]
    Write {
        /// Value being written when the failure occurred.
        context: &'static str,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A length-prefixed string was not valid UTF-8.
    #[error("{context} is not valid UTF-8")]
    InvalidUtf8 {
        /// Value whose payload failed to decode.
        context: &'static str,
    },
    /// An acknowledgement carried an unknown status byte.
    #[error("invalid acknowledgement status: {status}")]
    InvalidAck {
        /// Status byte received from the peer.
        status: u8,
    },
}

impl CodecError {
    pub(crate) const fn read(context: &'static str, source: io::Error) -> Self {
        Self::Read { context, source }
    }

    pub(crate) const fn write(context: &'static str, source: io::Error) -> Self {
        Self::Write { context, source }
    }

    /// Reports whether the failure means the peer has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        let source = match self {
            Self::Read { source, .. } | Self::Write { source, .. } => source,
            Self::InvalidUtf8 { .. } | Self::InvalidAck { .. } => return false,
        };
        matches!(
            source.kind(),
            io::ErrorKind::BrokenPipe
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::NotConnected
                | io::ErrorKind::UnexpectedEof
        )
    }
}
