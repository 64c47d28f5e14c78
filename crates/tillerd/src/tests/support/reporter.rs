//! Test double for [`HealthReporter`] that records structured events for
//! assertions.

use std::sync::Mutex;

use camino::Utf8Path;
use tiller_config::Config;

use crate::bootstrap::BootstrapError;
use crate::dispatch::ConnectionError;
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// The command socket started accepting connections.
    ServerListening,
    /// The command server shut down.
    ServerClosed,
    /// A connection ended with an error description.
    ConnectionFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn server_listening(&self, _socket: &Utf8Path) {
        self.record(HealthEvent::ServerListening);
    }

    fn server_closed(&self, _socket: &Utf8Path) {
        self.record(HealthEvent::ServerClosed);
    }

    fn connection_failed(&self, error: &ConnectionError) {
        self.record(HealthEvent::ConnectionFailed(error.to_string()));
    }
}
