//! Fake daemon utilities for behavioural tests.
//!
//! Binds a Unix socket in a temporary directory, accepts one connection,
//! records what the client sent and answers with a canned reply.

use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;
use tiller_proto::{
    Command, ServiceAck, StatusMessage, read_command, read_interval, write_ack, write_log_line,
    write_status,
};

/// Reply the fake daemon sends after reading the command byte.
#[derive(Debug, Clone)]
pub(in crate::tests) enum Reply {
    Ack(ServiceAck),
    Status(Vec<StatusMessage>),
    Lines(Vec<String>),
}

/// What the client sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(in crate::tests) struct Request {
    pub command: Option<u8>,
    pub interval: Option<i64>,
}

/// A fake daemon that serves a single connection.
pub(in crate::tests) struct FakeDaemon {
    _dir: TempDir,
    socket_path: PathBuf,
    request: Arc<Mutex<Request>>,
    result: Arc<Mutex<Option<Result<()>>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeDaemon {
    /// Spawns a fake daemon that answers its first client with `reply`.
    pub fn spawn(reply: Reply) -> Result<Self> {
        let dir = TempDir::new().context("create socket directory")?;
        let socket_path = dir.path().join("command.sock");
        let listener = UnixListener::bind(&socket_path).context("bind fake daemon")?;
        listener
            .set_nonblocking(true)
            .context("fake daemon nonblocking")?;

        let request = Arc::new(Mutex::new(Request::default()));
        let result: Arc<Mutex<Option<Result<()>>>> = Arc::new(Mutex::new(None));
        let request_clone = Arc::clone(&request);
        let result_clone = Arc::clone(&result);
        let handle = thread::spawn(move || {
            let outcome = Self::serve_client(&listener, &reply, &request_clone);
            if let Ok(mut guard) = result_clone.lock() {
                *guard = Some(outcome);
            }
        });

        Ok(Self {
            _dir: dir,
            socket_path,
            request,
            result,
            handle: Some(handle),
        })
    }

    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    /// Waits for the daemon thread to finish and returns the recorded request.
    pub fn take_request(&mut self) -> Result<Request> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("fake daemon thread panicked"))?;
        }
        if let Some(outcome) = self
            .result
            .lock()
            .map_err(|error| anyhow!("lock fake daemon result: {error}"))?
            .take()
        {
            outcome.context("fake daemon failed")?;
        }
        let request = self
            .request
            .lock()
            .map_err(|error| anyhow!("lock request: {error}"))?;
        Ok(request.clone())
    }

    fn serve_client(
        listener: &UnixListener,
        reply: &Reply,
        request: &Mutex<Request>,
    ) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            match listener.accept() {
                Ok((stream, _)) => return Self::answer(stream, reply, request),
                Err(ref error)
                    if error.kind() == io::ErrorKind::WouldBlock && Instant::now() < deadline =>
                {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => {
                    // The CLI never connected, for example after a usage error.
                    return Ok(());
                }
                Err(error) => return Err(error).context("accept connection"),
            }
        }
    }

    fn answer(mut stream: UnixStream, reply: &Reply, request: &Mutex<Request>) -> Result<()> {
        stream
            .set_nonblocking(false)
            .context("blocking client stream")?;
        let command = read_command(&mut stream).context("read command byte")?;
        let interval = if command == Some(Command::Status.as_byte()) {
            Some(read_interval(&mut stream).context("read status interval")?)
        } else {
            None
        };
        *request
            .lock()
            .map_err(|error| anyhow!("lock request: {error}"))? = Request { command, interval };

        match reply {
            Reply::Ack(ack) => write_ack(&mut stream, ack).context("write ack")?,
            Reply::Status(records) => {
                for record in records {
                    if write_status(&mut stream, record).is_err() {
                        // The client stopped reading after its count.
                        break;
                    }
                }
            }
            Reply::Lines(lines) => {
                for line in lines {
                    if write_log_line(&mut stream, line).is_err() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
