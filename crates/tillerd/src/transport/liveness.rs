//! Detection of clients that have gone away.
//!
//! Streaming sub-protocols only write after the request has been read, so the
//! client has nothing more to send. A watcher thread reads a clone of the
//! stream and signals once the read reports end of stream or an error.

use std::cell::Cell;
use std::io::{self, Read};
use std::os::unix::net::UnixStream;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

/// Notification channel fed by a per-connection watcher thread.
///
/// Loss is latched: once observed, every later query reports it.
pub(crate) struct Liveness {
    lost: Receiver<()>,
    latched: Cell<bool>,
}

impl Liveness {
    /// Starts watching `stream`. Bytes the client sends after its request are
    /// discarded.
    pub(crate) fn watch(stream: &UnixStream) -> io::Result<Self> {
        let mut reader = stream.try_clone()?;
        let (notify, lost) = mpsc::channel();
        thread::Builder::new()
            .name("tillerd-liveness".to_owned())
            .spawn(move || {
                let mut discard = [0_u8; 64];
                loop {
                    match reader.read(&mut discard) {
                        Ok(0) => break,
                        Ok(_) => {}
                        Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                        Err(_) => break,
                    }
                }
                drop(notify.send(()));
            })?;
        Ok(Self {
            lost,
            latched: Cell::new(false),
        })
    }

    /// Reports whether the client has gone away, without waiting.
    pub(crate) fn is_lost(&self) -> bool {
        if !self.latched.get() && !matches!(self.lost.try_recv(), Err(TryRecvError::Empty)) {
            self.latched.set(true);
        }
        self.latched.get()
    }

    /// Waits up to `timeout` for the client to go away.
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        if !self.latched.get()
            && !matches!(
                self.lost.recv_timeout(timeout),
                Err(RecvTimeoutError::Timeout)
            )
        {
            self.latched.set(true);
        }
        self.latched.get()
    }
}
