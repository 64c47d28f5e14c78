//! Scenario world for command server behaviour: a started server, its
//! collaborators and whatever the client observed.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use tempfile::TempDir;
use tiller_proto::{
    ClientError, Command, CommandClient, ServiceAck, ServiceVerb, StatusMessage, read_log_line,
};

use super::engine::StubEngine;
use super::reporter::RecordingHealthReporter;
use crate::log_bus::LogBus;
use crate::server::{CommandServer, ServerError};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Scenario world shared across command server steps.
pub struct ServerWorld {
    _dir: TempDir,
    socket_path: Utf8PathBuf,
    pub engine: Arc<StubEngine>,
    pub reporter: Arc<RecordingHealthReporter>,
    pub server: CommandServer,
    pub status: Option<StatusMessage>,
    pub raw_reply: Option<Vec<u8>>,
    pub ack: Option<ServiceAck>,
    pub log_stream: Option<UnixStream>,
    pub start_error: Option<ServerError>,
    pub connect_error: Option<ClientError>,
}

impl ServerWorld {
    /// Builds a world around an idle server whose bus keeps `history` lines.
    #[must_use]
    pub fn with_history(history: usize) -> Self {
        let dir = TempDir::new().expect("failed to create socket directory");
        let socket_path = Utf8PathBuf::from_path_buf(dir.path().join("tillerd.sock"))
            .expect("temporary socket path was not valid UTF-8");
        let engine = Arc::new(StubEngine::default());
        let reporter = Arc::new(RecordingHealthReporter::default());
        let server = CommandServer::new(
            socket_path.clone(),
            engine.clone(),
            LogBus::new(history, 16),
        )
        .with_reporter(reporter.clone());
        Self {
            _dir: dir,
            socket_path,
            engine,
            reporter,
            server,
            status: None,
            raw_reply: None,
            ack: None,
            log_stream: None,
            start_error: None,
            connect_error: None,
        }
    }

    /// Path of the server's command socket.
    #[must_use]
    pub fn socket_path(&self) -> &Utf8PathBuf {
        &self.socket_path
    }

    /// Client bound to the server's socket.
    #[must_use]
    pub fn client(&self) -> CommandClient {
        CommandClient::new(self.socket_path.as_std_path())
    }

    /// Starts the server, keeping any lifecycle error for later steps.
    pub fn start(&mut self) {
        if let Err(error) = self.server.start() {
            self.start_error = Some(error);
        }
    }

    /// Reads the first status record at the given interval.
    pub fn request_status(&mut self, interval: Duration) {
        let mut stream = self.client().status(interval).expect("status request");
        let record = stream
            .next()
            .expect("status stream ended early")
            .expect("status record");
        drop(stream);
        self.status = Some(record);
    }

    /// Sends a raw command byte and collects everything the server writes
    /// back.
    pub fn send_raw(&mut self, byte: u8) {
        let mut stream = self.open(byte);
        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).expect("read reply");
        self.raw_reply = Some(reply);
    }

    /// Sends a service verb and keeps the acknowledgement.
    pub fn send_verb(&mut self, verb: ServiceVerb) {
        let ack = self.client().service(verb).expect("service request");
        self.ack = Some(ack);
    }

    /// Opens a log subscription.
    pub fn subscribe(&mut self) {
        let stream = self
            .client()
            .connect(Command::Log)
            .expect("log subscription");
        stream
            .set_read_timeout(Some(CLIENT_TIMEOUT))
            .expect("set read timeout");
        self.log_stream = Some(stream);
    }

    /// Reads `count` lines from the log subscription.
    pub fn read_lines(&mut self, count: usize) -> Vec<String> {
        let stream = self.log_stream.as_mut().expect("no log subscription");
        (0..count)
            .map(|_| {
                read_log_line(stream)
                    .expect("read log line")
                    .expect("log stream ended early")
            })
            .collect()
    }

    /// Reports whether the log subscription reached a clean end of stream.
    pub fn log_stream_ended(&mut self) -> bool {
        let stream = self.log_stream.as_mut().expect("no log subscription");
        matches!(read_log_line(stream), Ok(None))
    }

    /// Attempts a fresh connection and keeps the failure, if any.
    pub fn try_connect(&mut self) {
        self.connect_error = self.client().connect(Command::Status).err();
    }

    fn open(&self, byte: u8) -> UnixStream {
        let mut stream =
            UnixStream::connect(self.socket_path.as_std_path()).expect("connect to server");
        stream
            .set_read_timeout(Some(CLIENT_TIMEOUT))
            .expect("set read timeout");
        stream.write_all(&[byte]).expect("write command byte");
        stream
    }
}

impl Drop for ServerWorld {
    fn drop(&mut self) {
        drop(self.server.close());
    }
}
