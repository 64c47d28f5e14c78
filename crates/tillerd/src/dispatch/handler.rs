//! Connection handler that decodes the command byte and runs the selected
//! sub-protocol.

use std::fmt;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize};

use tiller_proto::{Command, ServiceVerb, read_command, write_ack};
use tracing::debug;

use crate::health::HealthReporter;
use crate::log_bus::LogBus;
use crate::service::ServiceBridge;
use crate::status::StatusSampler;
use crate::transport::{ConnectionGuard, ConnectionHandler};

use super::errors::ConnectionError;
use super::{DISPATCH_TARGET, log_stream, status_stream};

/// Stage of a connection's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for the command byte.
    AwaitCommand,
    /// Running the sub-protocol for a decoded command.
    Dispatched(Command),
    /// The connection has ended.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitCommand => formatter.write_str("await_command"),
            Self::Dispatched(command) => write!(formatter, "dispatched({command})"),
            Self::Closed => formatter.write_str("closed"),
        }
    }
}

/// Shared server state handed to every connection thread.
pub(crate) struct CommandDispatcher {
    bus: LogBus,
    sampler: Arc<dyn StatusSampler>,
    bridge: ServiceBridge,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
    reporter: Arc<dyn HealthReporter>,
}

impl CommandDispatcher {
    pub(crate) fn new(
        bus: LogBus,
        sampler: Arc<dyn StatusSampler>,
        bridge: ServiceBridge,
        shutdown: Arc<AtomicBool>,
        active: Arc<AtomicUsize>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            bus,
            sampler,
            bridge,
            shutdown,
            active,
            reporter,
        }
    }

    fn serve(&self, stream: &mut UnixStream) -> Result<(), ConnectionError> {
        debug!(target: DISPATCH_TARGET, state = %ConnectionState::AwaitCommand);
        let Some(byte) = read_command(stream)? else {
            debug!(target: DISPATCH_TARGET, "client closed before sending a command");
            return Ok(());
        };
        let command = Command::try_from(byte)?;
        debug!(
            target: DISPATCH_TARGET,
            state = %ConnectionState::Dispatched(command),
            "dispatching command"
        );

        if let Some(verb) = command.service_verb() {
            return self.acknowledge(stream, verb);
        }
        match command {
            Command::Status => status_stream::serve(stream, self.sampler.as_ref(), &self.shutdown),
            _ => log_stream::serve(stream, &self.bus),
        }
    }

    fn acknowledge(&self, stream: &mut UnixStream, verb: ServiceVerb) -> Result<(), ConnectionError> {
        let ack = self.bridge.execute(verb);
        write_ack(stream, &ack)?;
        Ok(())
    }
}

impl ConnectionHandler for CommandDispatcher {
    fn handle(&self, mut stream: UnixStream) {
        let guard = ConnectionGuard::new(&stream, Arc::clone(&self.active));
        let outcome = self.serve(&mut stream);
        drop(guard);

        match outcome {
            Ok(()) => {}
            Err(error) if error.is_disconnect() => {
                debug!(
                    target: DISPATCH_TARGET,
                    error = %error,
                    "client went away"
                );
            }
            Err(error) => self.reporter.connection_failed(&error),
        }
        debug!(target: DISPATCH_TARGET, state = %ConnectionState::Closed);
    }
}
