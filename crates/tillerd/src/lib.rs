//! Local control-plane daemon for a long-running proxy engine.
//!
//! The daemon listens on a filesystem domain socket. Each connection opens
//! with a single command byte (see [`tiller_proto`]) that selects one of five
//! sub-protocols:
//!
//! - `Log` streams the retained backlog from the [`LogBus`], then live lines.
//! - `Status` writes a fresh [`tiller_proto::StatusMessage`] at a
//!   client-chosen interval.
//! - `ServiceStop`, `ServiceReload` and `CloseConnections` forward a one-shot
//!   request to the engine through the [`ServiceHandler`] trait and write a
//!   single acknowledgement.
//!
//! [`CommandServer`] owns the socket, the listener thread and the log bus.
//! Every accepted connection runs on its own thread; failures are logged and
//! never affect the listener or other connections.
//!
//! The bootstrap sequence loads configuration, installs telemetry that also
//! feeds the log bus, and prepares the socket directory. Health reporting
//! hooks emit structured events at each stage so operators can diagnose
//! failures quickly.

mod bootstrap;
mod dispatch;
mod health;
mod log_bus;
mod process;
mod server;
mod service;
mod status;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{ConnectionError, ConnectionState};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use log_bus::{BusError, LogBus, LogLine, SubscriberId, Subscription};
pub use process::{
    LaunchError, ShutdownError, ShutdownReason, ShutdownRequests, ShutdownSignal, ShutdownTrigger,
    StandaloneEngine, SystemShutdownSignal, run_daemon, run_daemon_with, shutdown_channel,
};
pub use server::{CommandServer, ServerError};
pub use service::{ServiceBridge, ServiceError, ServiceHandler};
pub use status::{ProcessSampler, StatusSampler};
pub use telemetry::{BusLayer, TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
