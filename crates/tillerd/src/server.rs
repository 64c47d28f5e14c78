//! Command server lifecycle: socket, listener, log bus and collaborators.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::dispatch::CommandDispatcher;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::log_bus::LogBus;
use crate::service::{ServiceBridge, ServiceHandler};
use crate::status::{ProcessSampler, StatusSampler};
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

/// Errors raised by [`CommandServer`] lifecycle operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `start` was called on a server that is already running.
    #[error("command server is already running")]
    AlreadyStarted,
    /// The server was closed and cannot be restarted.
    #[error("command server has been closed")]
    AlreadyClosed,
    /// The socket listener failed.
    #[error("command socket listener failed: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
}

impl From<ListenerError> for ServerError {
    fn from(source: ListenerError) -> Self {
        Self::Listener { source }
    }
}

enum Lifecycle {
    Created,
    Running(ListenerHandle),
    Closed,
}

/// Local control-plane server bound to one domain socket.
///
/// Constructed idle; [`CommandServer::start`] binds the socket and spawns the
/// listener, [`CommandServer::close`] stops it and releases every log
/// subscriber. A closed server cannot be started again.
pub struct CommandServer {
    socket_path: Utf8PathBuf,
    bus: LogBus,
    handler: Arc<dyn ServiceHandler>,
    sampler: Arc<dyn StatusSampler>,
    reporter: Arc<dyn HealthReporter>,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
    lifecycle: Mutex<Lifecycle>,
}

impl CommandServer {
    /// Creates an idle server for `socket_path`.
    ///
    /// Status records are sampled from the current process. Lifecycle events
    /// go to a [`StructuredHealthReporter`] unless overridden.
    pub fn new(
        socket_path: impl Into<Utf8PathBuf>,
        handler: Arc<dyn ServiceHandler>,
        bus: LogBus,
    ) -> Self {
        let active = Arc::new(AtomicUsize::new(0));
        let sampler = Arc::new(ProcessSampler::new(
            Arc::clone(&handler),
            Arc::clone(&active),
        ));
        Self {
            socket_path: socket_path.into(),
            bus,
            handler,
            sampler,
            reporter: Arc::new(StructuredHealthReporter::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
            active,
            lifecycle: Mutex::new(Lifecycle::Created),
        }
    }

    /// Replaces the health reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn HealthReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Binds the socket, removing any file already at the path, and starts
    /// accepting connections.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::AlreadyStarted`] or
    /// [`ServerError::AlreadyClosed`] on lifecycle misuse, and
    /// [`ServerError::Listener`] when the socket cannot be bound.
    pub fn start(&self) -> Result<(), ServerError> {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        match *lifecycle {
            Lifecycle::Created => {}
            Lifecycle::Running(_) => return Err(ServerError::AlreadyStarted),
            Lifecycle::Closed => return Err(ServerError::AlreadyClosed),
        }

        let listener = SocketListener::bind(&self.socket_path)?;
        let dispatcher = Arc::new(CommandDispatcher::new(
            self.bus.clone(),
            Arc::clone(&self.sampler),
            ServiceBridge::new(Arc::clone(&self.handler)),
            Arc::clone(&self.shutdown),
            Arc::clone(&self.active),
            Arc::clone(&self.reporter),
        ));
        let handle = listener.start(dispatcher, Arc::clone(&self.shutdown))?;
        *lifecycle = Lifecycle::Running(handle);
        drop(lifecycle);

        self.reporter.server_listening(&self.socket_path);
        Ok(())
    }

    /// Stops the listener, waits for it to exit and closes the log bus.
    ///
    /// Status loops observe the shutdown flag and log subscribers are
    /// released; other open connections are left to finish on their own.
    /// Closing an already closed server is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Listener`] if the listener thread panicked.
    pub fn close(&self) -> Result<(), ServerError> {
        let previous = {
            let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *lifecycle, Lifecycle::Closed)
        };

        self.shutdown.store(true, Ordering::SeqCst);
        let joined = match previous {
            Lifecycle::Running(handle) => {
                handle.shutdown();
                handle.join()
            }
            Lifecycle::Created => Ok(()),
            Lifecycle::Closed => return Ok(()),
        };
        self.bus.close();
        self.reporter.server_closed(&self.socket_path);
        joined.map_err(ServerError::from)
    }

    /// Publishes a line to every log subscriber.
    pub fn publish(&self, line: &str) {
        self.bus.publish(line);
    }

    /// Log bus shared with connection handlers.
    #[must_use]
    pub fn bus(&self) -> &LogBus {
        &self.bus
    }

    /// Path of the command socket.
    #[must_use]
    pub fn socket_path(&self) -> &Utf8Path {
        &self.socket_path
    }

    /// Number of connections currently being handled.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Reports whether the listener is accepting connections. Becomes `false`
    /// after [`CommandServer::close`] or once an accept failure ended the
    /// listener loop.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        let lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(&*lifecycle, Lifecycle::Running(handle) if !handle.is_finished())
    }
}

impl std::fmt::Debug for CommandServer {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CommandServer")
            .field("socket_path", &self.socket_path)
            .field("active_connections", &self.active_connections())
            .finish_non_exhaustive()
    }
}
