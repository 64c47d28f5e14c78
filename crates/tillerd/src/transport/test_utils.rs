//! Test helpers for the transport module.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::ConnectionHandler;

/// Handler that echoes the first byte it reads and counts served
/// connections.
pub(crate) struct EchoHandler {
    served: Arc<AtomicUsize>,
}

impl EchoHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let served = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            served: Arc::clone(&served),
        });
        (served, handler)
    }
}

impl ConnectionHandler for EchoHandler {
    fn handle(&self, mut stream: UnixStream) {
        let mut byte = [0_u8; 1];
        if stream.read_exact(&mut byte).is_ok() {
            drop(stream.write_all(&byte));
        }
        self.served.fetch_add(1, Ordering::SeqCst);
    }
}
