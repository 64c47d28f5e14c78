//! Blocking client for the command socket.
//!
//! Each request opens its own connection, mirroring how the daemon dedicates
//! a connection to a single sub-protocol.

use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::ack::ServiceAck;
use crate::codec::{read_ack, read_log_line, read_status, write_command, write_interval};
use crate::command::{Command, ServiceVerb};
use crate::error::CodecError;
use crate::status::{StatusMessage, interval_to_wire};

/// Failures surfaced by [`CommandClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The daemon socket could not be reached.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        /// Socket path that was dialled.
        path: PathBuf,
        /// Underlying connection failure.
        #[source]
        source: std::io::Error,
    },
    /// A framed value could not be exchanged.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A status stream was requested with a zero interval.
    #[error("status interval must be positive")]
    ZeroInterval,
}

/// Client handle bound to a daemon socket path.
#[derive(Debug, Clone)]
pub struct CommandClient {
    socket_path: PathBuf,
}

impl CommandClient {
    /// Creates a client for the socket at `socket_path`.
    #[must_use]
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// Socket path this client dials.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Opens a connection and sends `command`, leaving the stream ready for
    /// the sub-protocol.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connect`] when the socket is unreachable and
    /// [`ClientError::Codec`] when the command byte cannot be written.
    pub fn connect(&self, command: Command) -> Result<UnixStream, ClientError> {
        let mut stream =
            UnixStream::connect(&self.socket_path).map_err(|source| ClientError::Connect {
                path: self.socket_path.clone(),
                source,
            })?;
        write_command(&mut stream, command)?;
        Ok(stream)
    }

    /// Starts a status subscription that yields one record per `interval`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ZeroInterval`] for a zero interval, otherwise
    /// the errors of [`CommandClient::connect`].
    pub fn status(&self, interval: Duration) -> Result<StatusStream, ClientError> {
        if interval.is_zero() {
            return Err(ClientError::ZeroInterval);
        }
        let mut stream = self.connect(Command::Status)?;
        write_interval(&mut stream, interval_to_wire(interval))?;
        Ok(StatusStream { stream })
    }

    /// Subscribes to the daemon log: the retained backlog first, then live
    /// lines.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`CommandClient::connect`].
    pub fn logs(&self) -> Result<LogStream, ClientError> {
        let stream = self.connect(Command::Log)?;
        Ok(LogStream { stream })
    }

    /// Sends a one-shot service verb and waits for its acknowledgement.
    ///
    /// An engine failure is reported through [`ServiceAck::Failed`], not as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns connection or framing errors.
    pub fn service(&self, verb: ServiceVerb) -> Result<ServiceAck, ClientError> {
        let mut stream = self.connect(verb.into())?;
        Ok(read_ack(&mut stream)?)
    }
}

/// Iterator over status records pushed by the daemon.
///
/// Ends when the daemon closes the connection.
#[derive(Debug)]
pub struct StatusStream {
    stream: UnixStream,
}

impl Iterator for StatusStream {
    type Item = Result<StatusMessage, ClientError>;

    fn next(&mut self) -> Option<Self::Item> {
        read_status(&mut self.stream)
            .map_err(ClientError::from)
            .transpose()
    }
}

/// Iterator over log lines pushed by the daemon.
///
/// Ends when the daemon closes the connection.
#[derive(Debug)]
pub struct LogStream {
    stream: UnixStream,
}

impl LogStream {
    /// Closes the subscription.
    pub fn close(self) {
        drop(self.stream.shutdown(std::net::Shutdown::Both));
    }
}

impl Iterator for LogStream {
    type Item = Result<String, ClientError>;

    fn next(&mut self) -> Option<Self::Item> {
        read_log_line(&mut self.stream)
            .map_err(ClientError::from)
            .transpose()
    }
}
