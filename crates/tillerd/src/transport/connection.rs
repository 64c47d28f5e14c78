//! Connection handling abstractions for the command listener.

use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection until it ends. Implementations should
    /// avoid panicking.
    fn handle(&self, stream: UnixStream);
}

/// Scoped owner of a connection slot.
///
/// Registers the connection in the shared gauge on creation. On drop it shuts
/// the socket down in both directions, which also wakes any liveness watcher
/// blocked on a read, and releases the slot.
pub(crate) struct ConnectionGuard {
    stream: Option<UnixStream>,
    active: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    pub(crate) fn new(stream: &UnixStream, active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self {
            stream: stream.try_clone().ok(),
            active,
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream.shutdown(Shutdown::Both));
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn guard_tracks_slot_and_closes_stream() {
        let (server, mut client) = UnixStream::pair().expect("socket pair");
        let active = Arc::new(AtomicUsize::new(0));

        let guard = ConnectionGuard::new(&server, Arc::clone(&active));
        assert_eq!(active.load(Ordering::SeqCst), 1);
        drop(guard);

        assert_eq!(active.load(Ordering::SeqCst), 0);
        let mut buf = [0_u8; 1];
        assert_eq!(client.read(&mut buf).expect("read after shutdown"), 0);
    }
}
