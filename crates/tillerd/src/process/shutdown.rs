//! Shutdown requests from termination signals and the engine.

use std::fmt;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Why the daemon is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// A termination signal arrived.
    Signal(i32),
    /// The engine handled a stop command.
    EngineStop,
    /// Every trigger was dropped without firing.
    Detached,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(signal) => write!(formatter, "signal {signal}"),
            Self::EngineStop => formatter.write_str("engine stop request"),
            Self::Detached => formatter.write_str("shutdown triggers detached"),
        }
    }
}

/// Sending half of the shutdown channel.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    sender: Sender<ShutdownReason>,
}

impl ShutdownTrigger {
    /// Asks the daemon to stop. Returns `false` once nothing is waiting any
    /// more.
    #[must_use]
    pub fn request(&self, reason: ShutdownReason) -> bool {
        self.sender.send(reason).is_ok()
    }
}

/// Receiving half of the shutdown channel.
#[derive(Debug)]
pub struct ShutdownRequests {
    receiver: Receiver<ShutdownReason>,
}

impl ShutdownRequests {
    /// Blocks until the first shutdown request arrives.
    #[must_use]
    pub fn wait(&self) -> ShutdownReason {
        self.receiver.recv().unwrap_or(ShutdownReason::Detached)
    }
}

/// Creates a connected trigger and request pair.
#[must_use]
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownRequests) {
    let (sender, receiver) = mpsc::channel();
    (ShutdownTrigger { sender }, ShutdownRequests { receiver })
}

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Arranges for `trigger` to fire when the process should stop.
    fn install(&self, trigger: ShutdownTrigger) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The signal watcher thread could not be started.
    #[error("failed to spawn signal watcher: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener that waits for SIGTERM, SIGINT, SIGQUIT or SIGHUP.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Builds a signal listener.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn install(&self, trigger: ShutdownTrigger) -> Result<(), ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        thread::Builder::new()
            .name("tillerd-signals".to_owned())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    info!(
                        target: PROCESS_TARGET,
                        signal,
                        "shutdown signal received"
                    );
                    if !trigger.request(ShutdownReason::Signal(signal)) {
                        info!(target: PROCESS_TARGET, "daemon already stopping");
                    }
                }
            })
            .map_err(|source| ShutdownError::Spawn { source })?;
        Ok(())
    }
}
