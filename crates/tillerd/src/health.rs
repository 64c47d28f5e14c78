//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use camino::Utf8Path;
use tiller_config::Config;

use crate::bootstrap::BootstrapError;
use crate::dispatch::ConnectionError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the command socket accepts connections.
    fn server_listening(&self, socket: &Utf8Path);

    /// Invoked after the server has stopped its listener and closed the bus.
    fn server_closed(&self, socket: &Utf8Path);

    /// Invoked when a connection ends with an error other than the client
    /// going away.
    fn connection_failed(&self, error: &ConnectionError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn server_listening(&self, socket: &Utf8Path) {
        (**self).server_listening(socket);
    }

    fn server_closed(&self, socket: &Utf8Path) {
        (**self).server_closed(socket);
    }

    fn connection_failed(&self, error: &ConnectionError) {
        (**self).connection_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.socket_path(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            log_history = config.log_history(),
            subscriber_capacity = config.subscriber_capacity(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn server_listening(&self, socket: &Utf8Path) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_listening",
            socket = %socket,
            "command server listening"
        );
    }

    fn server_closed(&self, socket: &Utf8Path) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "server_closed",
            socket = %socket,
            "command server closed"
        );
    }

    fn connection_failed(&self, error: &ConnectionError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "connection_failed",
            error = %error,
            "connection handler failed"
        );
    }
}
