//! Accept loop for the command socket.

use std::fs;
use std::io;
use std::os::unix::net::UnixListener;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use super::{ConnectionHandler, LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);

/// Listener bound to the command socket path.
#[derive(Debug)]
pub(crate) struct SocketListener {
    path: Utf8PathBuf,
    listener: UnixListener,
}

impl SocketListener {
    /// Removes any file already at `path`, then binds a fresh socket there.
    pub(crate) fn bind(path: &Utf8Path) -> Result<Self, ListenerError> {
        remove_existing(path)?;
        let listener = UnixListener::bind(path.as_std_path()).map_err(|source| {
            ListenerError::Bind {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            listener,
        })
    }

    /// Spawns the accept loop. The loop ends when `shutdown` is raised or an
    /// accept fails, and removes the socket file on the way out.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = self.listener.set_nonblocking(true) {
            cleanup_socket(&self.path);
            return Err(ListenerError::NonBlocking { source });
        }
        let shutdown_flag = Arc::clone(&shutdown);
        let handle = thread::spawn(move || run_accept_loop(&self, &shutdown_flag, &handler));
        Ok(ListenerHandle {
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to the background accept thread.
pub(crate) struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Reports whether the accept loop has exited, either through shutdown or
    /// because an accept failed.
    pub(crate) fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .is_none_or(thread::JoinHandle::is_finished)
    }

    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: &SocketListener,
    shutdown: &AtomicBool,
    handler: &Arc<dyn ConnectionHandler>,
) {
    info!(
        target: LISTENER_TARGET,
        path = %listener.path,
        "command socket listening"
    );
    while !shutdown.load(Ordering::SeqCst) {
        match listener.listener.accept() {
            Ok((stream, _)) => {
                if let Err(error) = stream.set_nonblocking(false) {
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "failed to configure accepted connection"
                    );
                    continue;
                }
                let handler = Arc::clone(handler);
                let spawned = thread::Builder::new()
                    .name("tillerd-conn".to_owned())
                    .spawn(move || handler.handle(stream));
                if let Err(error) = spawned {
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "failed to spawn connection handler"
                    );
                }
            }
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(error) => {
                // Accept failures mean the socket is gone; nothing is retried.
                warn!(
                    target: LISTENER_TARGET,
                    error = %error,
                    "socket accept failed, stopping listener"
                );
                break;
            }
        }
    }

    cleanup_socket(&listener.path);
    debug!(
        target: LISTENER_TARGET,
        path = %listener.path,
        "command socket closed"
    );
}

fn remove_existing(path: &Utf8Path) -> Result<(), ListenerError> {
    match fs::remove_file(path.as_std_path()) {
        Ok(()) => {
            debug!(
                target: LISTENER_TARGET,
                path = %path,
                "removed existing file at socket path"
            );
            Ok(())
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ListenerError::StaleCleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn cleanup_socket(path: &Utf8Path) {
    if let Err(error) = fs::remove_file(path.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: LISTENER_TARGET,
            error = %error,
            path = %path,
            "failed to remove unix socket file"
        );
    }
}
